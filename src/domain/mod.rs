//! Domain models and types for ledgersync.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`AccountId`], [`TransactionId`], [`TransactionKey`])
//! - **The transaction record** ([`Transaction`], [`StoredTransaction`])
//! - **The export metadata sidecar** ([`ExportMetadata`], [`MetadataPatch`])
//! - **Upstream object shapes** ([`PlaidTransaction`], [`PlaidAccount`], [`PlaidItem`])
//! - **Error types** ([`SyncError`], [`CosmosDbError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SyncError>`]:
//!
//! ```rust
//! use ledgersync::domain::{Result, TransactionId};
//!
//! fn parse(id: &str) -> Result<TransactionId> {
//!     TransactionId::new(id).map_err(ledgersync::domain::SyncError::Validation)
//! }
//! # assert!(parse("").is_err());
//! ```

pub mod errors;
pub mod ids;
pub mod metadata;
pub mod timestamp;
pub mod transaction;
pub mod upstream;

// Re-export commonly used types for convenience
pub use errors::{CosmosDbError, Result, SyncError};
pub use ids::{AccountId, TransactionId, TransactionKey};
pub use metadata::{ExportMetadata, MetadataPatch, METADATA_FIELD};
pub use transaction::{StoredTransaction, Transaction};
pub use upstream::{AccountBalances, PlaidAccount, PlaidItem, PlaidTransaction};
