use thiserror::Error;

/// Errors surfaced by the logbook domain: record parsing, validation and the
/// CSS calculator. Glue code wraps these in `anyhow` with context.
#[derive(Debug, Error)]
pub enum LogbookError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Record store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl LogbookError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type LogbookResult<T> = Result<T, LogbookError>;

#[cfg(test)]
mod tests {
    use super::LogbookError;

    #[test]
    fn invalid_input_message_is_prefixed() {
        let error = LogbookError::invalid("rpe must be between 1 and 10");
        assert!(error.is_invalid_input());
        assert_eq!(
            error.to_string(),
            "Invalid input: rpe must be between 1 and 10"
        );
    }
}
