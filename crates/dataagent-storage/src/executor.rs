//! Query execution against the configured database.
//!
//! `QueryExecutor::execute` is the non-failing boundary used by the chat loop:
//! any error is logged and turns into an empty result. Callers therefore
//! cannot tell "no rows" from "the query failed"; `SqliteExecutor::try_execute`
//! keeps the error for callers that need it.

use std::sync::Mutex;

use tracing::{debug, error};

use dataagent_core::error::DataAgentError;

use crate::db::Database;
use crate::table::{Cell, TabularResult};

/// Executes literal query text and materializes the full result.
pub trait QueryExecutor: Send + Sync {
    /// Run `query` and return every row. Never fails; errors yield an empty result.
    fn execute(&self, query: &str) -> TabularResult;
}

/// SQLite-backed executor. Opens a new connection for every query.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    db: Database,
}

impl SqliteExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run `query`, returning the error instead of swallowing it.
    ///
    /// Statements without result columns (DDL, DML) are executed and produce
    /// an empty result. Blank text is rejected before a connection is opened.
    pub fn try_execute(&self, query: &str) -> Result<TabularResult, DataAgentError> {
        if query.trim().is_empty() {
            return Err(DataAgentError::Storage("Empty query".to_string()));
        }
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(query)
                .map_err(|e| DataAgentError::Storage(format!("Query prepare: {}", e)))?;

            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect();

            if columns.is_empty() {
                let changed = stmt
                    .execute([])
                    .map_err(|e| DataAgentError::Storage(format!("Statement execute: {}", e)))?;
                debug!(changed, "Statement executed without result columns");
                return Ok(TabularResult::empty());
            }

            let width = columns.len();
            let mut result = TabularResult::new(columns);
            let mut rows = stmt
                .query([])
                .map_err(|e| DataAgentError::Storage(format!("Query: {}", e)))?;

            while let Some(row) = rows
                .next()
                .map_err(|e| DataAgentError::Storage(format!("Row fetch: {}", e)))?
            {
                let mut cells = Vec::with_capacity(width);
                for i in 0..width {
                    let value = row
                        .get_ref(i)
                        .map_err(|e| DataAgentError::Storage(format!("Cell read: {}", e)))?;
                    cells.push(Cell::from(value));
                }
                result.push_row(cells)?;
            }

            debug!(rows = result.rows().len(), "Query materialized");
            Ok(result)
        })
    }
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&self, query: &str) -> TabularResult {
        match self.try_execute(query) {
            Ok(result) => result,
            Err(e) => {
                // Query text can carry user data; only debug builds log it.
                if cfg!(debug_assertions) {
                    error!(error = %e, query, "Query execution failed");
                } else {
                    error!(error = %e, "Query execution failed");
                }
                TabularResult::empty()
            }
        }
    }
}

/// Mock executor for testing.
///
/// Returns the same configured result for every query and records the query
/// text it was given, in order.
#[derive(Debug, Default)]
pub struct MockQueryExecutor {
    result: TabularResult,
    queries: Mutex<Vec<String>>,
}

impl MockQueryExecutor {
    /// Create a mock that answers every query with `result`.
    pub fn returning(result: TabularResult) -> Self {
        Self {
            result,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every query executed so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl QueryExecutor for MockQueryExecutor {
    fn execute(&self, query: &str) -> TabularResult {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        self.result.clone()
    }
}
