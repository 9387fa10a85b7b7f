//! External system integrations for ledgersync.
//!
//! - [`storage`] - Transaction storage contract and backend factory
//! - [`document`] - Document-store backend over a [`document::DocumentCollection`]
//! - [`cosmosdb`] - Azure Cosmos DB collection
//! - [`sqlite`] - Relational backend on SQLite
//! - [`plaid`] - Mappings from aggregation API objects to records
//!
//! # Example
//!
//! ```rust
//! use ledgersync::adapters::document::{DocumentStorage, MemoryCollection};
//! use ledgersync::adapters::storage::TransactionStorage;
//! use ledgersync::domain::AccountId;
//!
//! # async fn example() -> ledgersync::domain::Result<()> {
//! let storage = DocumentStorage::new(
//!     MemoryCollection::new("transactions"),
//!     AccountId::new("A1").unwrap(),
//! );
//! let fresh = storage.get_new_transactions(None, None).await?;
//! assert!(fresh.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod cosmosdb;
pub mod document;
pub mod plaid;
pub mod sqlite;
pub mod storage;
