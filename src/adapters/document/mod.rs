//! Document-store backend
//!
//! [`DocumentStorage`] implements the storage contract over any
//! [`DocumentCollection`]: Azure Cosmos DB in production, [`MemoryCollection`]
//! for tests and dry runs.

pub mod collection;
pub mod memory;
pub mod models;
pub mod storage;

pub use collection::{DocumentCollection, WriteOutcome};
pub use memory::MemoryCollection;
pub use storage::DocumentStorage;
