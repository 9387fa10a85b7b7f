//! Azure Cosmos DB integration
//!
//! Backs the document-store backend with a Cosmos DB container
//! partitioned by account.

pub mod client;
pub mod collection;
pub mod query;

pub use client::CosmosDbClient;
pub use collection::CosmosCollection;
