//! In-memory tabular result sets.

use std::fmt;

use rusqlite::types::ValueRef;

use dataagent_core::error::DataAgentError;

/// A single loosely typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) => Cell::Integer(i),
            ValueRef::Real(f) => Cell::Real(f),
            ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Real(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

impl fmt::Display for Cell {
    /// Null renders as nothing; blobs render as a SQL hex literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Real(r) => write!(f, "{}", r),
            Cell::Text(t) => f.write_str(t),
            Cell::Blob(bytes) => write!(f, "X'{}'", hex::encode_upper(bytes)),
        }
    }
}

/// Ordered columns and rows materialized from one query.
///
/// Every row holds exactly one cell per column; `push_row` rejects anything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularResult {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TabularResult {
    /// A result with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start a result with the given column names and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a result from columns and rows in one go.
    pub fn with_rows<C, R, V>(columns: C, rows: R) -> Result<Self, DataAgentError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = Vec<V>>,
        V: Into<Cell>,
    {
        let mut result = Self::new(columns.into_iter().map(Into::into).collect());
        for row in rows {
            result.push_row(row.into_iter().map(Into::into).collect())?;
        }
        Ok(result)
    }

    /// Append a row, checking it has one cell per column.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), DataAgentError> {
        if row.len() != self.columns.len() {
            return Err(DataAgentError::Storage(format!(
                "row has {} cells but result has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// True when there are neither columns nor rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}
