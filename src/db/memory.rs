use super::{RecordStore, Row, Table};
use crate::error::LogbookResult;
use std::collections::HashMap;

/// In-process store used by tests in place of SQLite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<Table, Vec<Row>>,
}

impl RecordStore for MemoryStore {
    fn append(&mut self, table: Table, row: &Row) -> LogbookResult<()> {
        let stored = table
            .header()
            .iter()
            .map(|column| {
                (
                    column.to_string(),
                    row.get(*column).cloned().unwrap_or_default(),
                )
            })
            .collect::<Row>();
        self.tables.entry(table).or_default().push(stored);
        Ok(())
    }

    fn fetch_all(&self, table: Table) -> LogbookResult<Vec<Row>> {
        Ok(self.tables.get(&table).cloned().unwrap_or_default())
    }
}
