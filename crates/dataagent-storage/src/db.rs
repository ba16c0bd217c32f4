//! Database connection management.
//!
//! `Database` is only a connection descriptor. Every call opens a fresh
//! rusqlite `Connection` and drops it afterwards; nothing is pooled or kept
//! open between queries.

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use dataagent_core::error::DataAgentError;

/// Connection target for a SQLite database.
///
/// Accepts a filesystem path or a `file:` URI. The database must already
/// exist: opening never creates a new file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    target: String,
}

impl Database {
    /// Describe a database by its connection string.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            target: connection_string.into(),
        }
    }

    /// The raw connection string.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Open a new connection to the target.
    pub fn connect(&self) -> Result<Connection, DataAgentError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&self.target, flags).map_err(|e| {
            DataAgentError::Storage(format!("Failed to open database {}: {}", self.target, e))
        })?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DataAgentError::Storage(format!("Failed to set pragmas: {}", e)))?;

        debug!(target_db = %self.target, "Database connection opened");
        Ok(conn)
    }

    /// Execute a closure against a freshly opened connection.
    ///
    /// The connection is closed when the closure returns.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DataAgentError>
    where
        F: FnOnce(&Connection) -> Result<T, DataAgentError>,
    {
        let conn = self.connect()?;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE Users (Id INTEGER PRIMARY KEY, Name TEXT);")
            .unwrap();
        drop(conn);
        let db = Database::new(path.to_string_lossy().to_string());
        (dir, db)
    }

    #[test]
    fn test_with_conn_reads_existing_file() {
        let (_dir, db) = seeded_db();
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM Users", [], |row| row.get(0))
                    .map_err(|e| DataAgentError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_each_call_uses_fresh_connection() {
        let (_dir, db) = seeded_db();
        db.with_conn(|conn| {
            conn.execute_batch("CREATE TEMP TABLE scratch (x INTEGER);")
                .map_err(|e| DataAgentError::Storage(e.to_string()))
        })
        .unwrap();

        // Temp tables die with their connection.
        let result = db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM scratch", [], |row| row.get::<_, i64>(0))
                .map_err(|e| DataAgentError::Storage(e.to_string()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let db = Database::new(path.to_string_lossy().to_string());

        let result = db.connect();
        assert!(matches!(result, Err(DataAgentError::Storage(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_target_round_trips() {
        let db = Database::new("file:shop.db?mode=ro");
        assert_eq!(db.target(), "file:shop.db?mode=ro");
    }
}
