//! Domain error types
//!
//! This module defines the error hierarchy for ledgersync.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Result alias used by every fallible ledgersync operation
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main ledgersync error type
///
/// This is the primary error type used throughout the crate. Storage backends
/// translate their driver errors into one of these variants before returning.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend unreachable at construction or call time
    #[error("Connection error: {0}")]
    Connection(String),

    /// Malformed key or a uniqueness violation the upsert logic did not resolve
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored record could not be decoded
    #[error("Malformed record {transaction_id}: {reason}")]
    MalformedRecord {
        /// Transaction ID of the offending record
        transaction_id: String,
        /// Why decoding failed
        reason: String,
    },

    /// Operation not offered by the selected backend
    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    UnsupportedOperation {
        /// Backend name
        backend: &'static str,
        /// Operation name
        operation: &'static str,
    },

    /// Cosmos DB-related errors
    #[error("Cosmos DB error: {0}")]
    CosmosDb(#[from] CosmosDbError),

    /// Database-related errors (generic)
    #[error("Database error: {0}")]
    Database(String),

    /// Validation errors, including missing required upstream fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl SyncError {
    /// Shorthand for a malformed stored record
    pub fn malformed(transaction_id: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::MalformedRecord {
            transaction_id: transaction_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a backend capability gap rather than a failure
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SyncError::UnsupportedOperation { .. })
    }
}

/// Cosmos DB-specific errors
///
/// Errors that occur when interacting with Azure Cosmos DB.
/// These errors don't expose third-party SDK types.
#[derive(Debug, Error)]
pub enum CosmosDbError {
    /// Failed to connect to Cosmos DB
    #[error("Failed to connect to Cosmos DB: {0}")]
    ConnectionFailed(String),

    /// Failed to create database
    #[error("Failed to create database: {0}")]
    DatabaseCreationFailed(String),

    /// Failed to create container
    #[error("Failed to create container: {0}")]
    ContainerCreationFailed(String),

    /// Failed to read a document
    #[error("Failed to read document: {0}")]
    ReadFailed(String),

    /// Failed to write document
    #[error("Failed to write document: {0}")]
    WriteFailed(String),

    /// Failed to query documents
    #[error("Failed to query documents: {0}")]
    QueryFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => SyncError::ConstraintViolation(err.to_string()),
            Some(ErrorCode::CannotOpen) | Some(ErrorCode::NotADatabase) => {
                SyncError::Connection(err.to_string())
            }
            _ => SyncError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_unsupported_operation_display() {
        let err = SyncError::UnsupportedOperation {
            backend: "sqlite",
            operation: "check_pending",
        };
        assert_eq!(
            err.to_string(),
            "Operation 'check_pending' is not supported by the sqlite backend"
        );
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_malformed_record_helper() {
        let err = SyncError::malformed("T1", "metadata is not an object");
        assert!(matches!(err, SyncError::MalformedRecord { ref transaction_id, .. } if transaction_id == "T1"));
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_cosmosdb_error_conversion() {
        let cosmos_err = CosmosDbError::QueryFailed("bad query".to_string());
        let err: SyncError = cosmos_err.into();
        assert!(matches!(err, SyncError::CosmosDb(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: SyncError = io_err.into();
        assert!(matches!(err, SyncError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: SyncError = json_err.into();
        assert!(matches!(err, SyncError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: SyncError = toml_err.into();
        assert!(matches!(err, SyncError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_rusqlite_constraint_conversion() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT NOT NULL UNIQUE);")
            .unwrap();
        conn.execute("INSERT INTO t (id) VALUES ('a')", []).unwrap();
        let sqlite_err = conn
            .execute("INSERT INTO t (id) VALUES ('a')", [])
            .unwrap_err();
        let err: SyncError = sqlite_err.into();
        assert!(matches!(err, SyncError::ConstraintViolation(_)));
    }

    #[test]
    fn test_sync_error_implements_std_error() {
        let err = SyncError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
