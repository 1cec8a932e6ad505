pub mod queries;

#[cfg(test)]
pub mod memory;

use crate::error::LogbookResult;
use anyhow::{Context, Result};
use clap::ValueEnum;
use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One stored row: column name to cell text, as a spreadsheet would hand it back.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
pub enum Table {
    #[value(name = "sessions")]
    Sessions,
    #[value(name = "targets")]
    Targets,
    #[value(name = "css-tests")]
    CssTests,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Sessions, Table::Targets, Table::CssTests];

    /// Logical table name.
    pub fn name(self) -> &'static str {
        match self {
            Table::Sessions => "Sessions",
            Table::Targets => "Targets",
            Table::CssTests => "CSSTests",
        }
    }

    fn sql_name(self) -> &'static str {
        match self {
            Table::Sessions => "sessions",
            Table::Targets => "targets",
            Table::CssTests => "css_tests",
        }
    }

    /// Fixed column order for both append and fetch.
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Table::Sessions => &[
                "date",
                "environment",
                "distance_m",
                "total_time_min",
                "moving_time_min",
                "rest_estimate_min",
                "sets_text",
                "css_pace",
                "avg_pace",
                "rpe",
                "notes",
                "team",
                "swimmer",
            ],
            Table::Targets => &["week_start", "swimmer", "km_target"],
            Table::CssTests => &[
                "date",
                "swimmer",
                "time_200_s",
                "time_400_s",
                "css_s_per_100",
            ],
        }
    }
}

/// Append-only record store. `fetch_all` returns rows in append order.
pub trait RecordStore {
    fn append(&mut self, table: Table, row: &Row) -> LogbookResult<()>;
    fn fetch_all(&self, table: Table) -> LogbookResult<Vec<Row>>;
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub fn count(&self, table: Table) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", table.sql_name()),
                [],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to count rows in {}", table.name()))?;

        Ok(count.max(0) as usize)
    }

    pub fn latest_session_date(&self) -> Result<Option<String>> {
        let date = self
            .conn
            .query_row(
                "SELECT date FROM sessions ORDER BY date DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();

        Ok(date)
    }
}

impl RecordStore for Database {
    fn append(&mut self, table: Table, row: &Row) -> LogbookResult<()> {
        let header = table.header();
        let placeholders = (1..=header.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.sql_name(),
            header.join(", "),
            placeholders
        );
        let values = header
            .iter()
            .map(|column| row.get(*column).cloned().unwrap_or_default());

        self.conn.execute(&statement, params_from_iter(values))?;
        debug!(table = table.name(), "row appended");

        Ok(())
    }

    fn fetch_all(&self, table: Table) -> LogbookResult<Vec<Row>> {
        let header = table.header();
        let mut statement = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY id ASC",
            header.join(", "),
            table.sql_name()
        ))?;

        let rows = statement
            .query_map([], |sql_row| {
                header
                    .iter()
                    .enumerate()
                    .map(|(index, column)| {
                        sql_row
                            .get::<_, String>(index)
                            .map(|value| (column.to_string(), value))
                    })
                    .collect::<rusqlite::Result<Row>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}
