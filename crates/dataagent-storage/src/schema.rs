//! Startup schema snapshot for the chat agent's system prompt.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::executor::QueryExecutor;
use crate::format::to_delimited_text;

/// Lists every column of every user table, one row per column.
///
/// Views and SQLite's internal `sqlite_*` tables are excluded. Rows come back
/// ordered by table name, then by column position within the table.
pub const SCHEMA_QUERY: &str = r"SELECT m.name AS TABLE_NAME, p.name AS COLUMN_NAME
FROM sqlite_master m
    JOIN pragma_table_info(m.name) p
WHERE m.type = 'table'
    AND m.name NOT LIKE 'sqlite\_%' ESCAPE '\'
ORDER BY m.name, p.cid;";

/// The database schema as delimited text, captured once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSnapshot {
    text: String,
    table_count: usize,
    column_count: usize,
}

impl SchemaSnapshot {
    /// Run the metadata query and format the result.
    ///
    /// Failures degrade the same way as any other query: the snapshot is
    /// empty and the model starts without schema knowledge.
    pub fn load<E: QueryExecutor + ?Sized>(executor: &E) -> Self {
        let result = executor.execute(SCHEMA_QUERY);

        let tables: BTreeSet<String> = result
            .rows()
            .iter()
            .filter_map(|row| row.first().map(ToString::to_string))
            .collect();

        let snapshot = Self {
            text: to_delimited_text(&result),
            table_count: tables.len(),
            column_count: result.rows().len(),
        };

        if snapshot.column_count == 0 {
            warn!("Schema snapshot is empty; the chat agent will not know any tables");
        } else {
            info!(
                tables = snapshot.table_count,
                columns = snapshot.column_count,
                "Schema snapshot loaded"
            );
        }
        snapshot
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }

    pub fn table_count(&self) -> usize {
        self.table_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }
}
