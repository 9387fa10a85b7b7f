//! SQLite connection handling
//!
//! One connection per storage instance, opened at construction and guarded by
//! a mutex. All work on it happens in synchronous closures.

use crate::config::SqliteConfig;
use crate::domain::{Result, SyncError};
use rusqlite::Connection;
use std::sync::Mutex;
use std::time::Duration;

/// In-memory database path
pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS transactions (
        account_id TEXT NOT NULL,
        transaction_id TEXT NOT NULL,
        created TEXT NOT NULL,
        updated TEXT NOT NULL,
        core_json TEXT NOT NULL,
        metadata_json TEXT
    );

    CREATE UNIQUE INDEX IF NOT EXISTS transactions_idx
        ON transactions(account_id, transaction_id);
";

/// Owned SQLite connection with the transactions schema in place
pub struct SqliteClient {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteClient {
    /// Opens (or creates) the database and ensures the schema exists
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Connection`] if the file can't be opened as a
    /// SQLite database.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let conn = if config.path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.path)
        }
        .map_err(|e| SyncError::Connection(format!("Failed to open {}: {e}", config.path)))?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.path != IN_MEMORY {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }
        conn.execute_batch(SCHEMA).map_err(|e| {
            SyncError::Connection(format!("Failed to initialize schema in {}: {e}", config.path))
        })?;

        tracing::info!(path = %config.path, "SQLite database opened");

        Ok(Self {
            conn: Mutex::new(conn),
            path: config.path.clone(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runs `f` with exclusive access to the connection
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| SyncError::Database("SQLite connection lock poisoned".to_string()))?;
        f(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(path: &str) -> SqliteConfig {
        SqliteConfig {
            path: path.to_string(),
            account_id: None,
            busy_timeout_ms: 1000,
        }
    }

    #[test]
    fn test_open_in_memory_creates_schema() {
        let client = SqliteClient::open(&config(IN_MEMORY)).unwrap();
        let tables: i64 = client
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'transactions'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_open_is_idempotent_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");
        let path = path.to_string_lossy();

        SqliteClient::open(&config(&path)).unwrap();
        let reopened = SqliteClient::open(&config(&path)).unwrap();
        assert_eq!(reopened.path(), path);
    }

    #[test]
    fn test_open_rejects_non_database_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "this is not a sqlite database, just some text padding it out").unwrap();

        let result = SqliteClient::open(&config(&path.to_string_lossy()));
        assert!(matches!(result, Err(SyncError::Connection(_))));
    }
}
