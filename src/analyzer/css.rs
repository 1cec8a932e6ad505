use crate::error::{LogbookError, LogbookResult};

/// Critical swim speed from a 200 and a 400 time trial, in seconds per 100.
///
/// `css = (t400 - t200) / 2`. Both times must be strictly positive.
pub fn css_pace(time_200_s: f64, time_400_s: f64) -> LogbookResult<f64> {
    let valid = |value: f64| value.is_finite() && value > 0.0;
    if !valid(time_200_s) || !valid(time_400_s) {
        return Err(LogbookError::invalid(format!(
            "Please enter valid times: 200m={time_200_s}s, 400m={time_400_s}s (both must be > 0)"
        )));
    }

    Ok((time_400_s - time_200_s) / 2.0)
}

/// `92.5` renders as `1:32.5`.
pub fn format_pace(seconds_per_100: f64) -> String {
    let sign = if seconds_per_100 < 0.0 { "-" } else { "" };
    let tenths = (seconds_per_100.abs() * 10.0).round() as u64;
    let minutes = tenths / 600;
    let seconds = (tenths % 600) as f64 / 10.0;

    format!("{sign}{minutes}:{seconds:04.1}")
}
