//! DataAgent storage crate - SQLite query execution and result formatting.
//!
//! Provides a per-call connection descriptor, a query executor that degrades
//! failures to an empty result, the delimited-text result formatter, and the
//! startup schema snapshot used to ground the chat agent.

pub mod db;
pub mod executor;
pub mod format;
pub mod schema;
pub mod table;

pub use db::Database;
pub use executor::{MockQueryExecutor, QueryExecutor, SqliteExecutor};
pub use format::to_delimited_text;
pub use schema::{SchemaSnapshot, SCHEMA_QUERY};
pub use table::{Cell, TabularResult};
