//! Document collection abstraction
//!
//! The document-store backend is written against this trait so the same
//! read/merge/write logic runs over Azure Cosmos DB and over the in-memory
//! collection. Writes are conditional: a create fails on an existing
//! document and a replace fails once the stored etag has moved on.

use crate::core::query::TransactionFilter;
use crate::domain::ids::{AccountId, TransactionKey};
use crate::domain::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// System property carrying the version of a stored document
pub const ETAG_FIELD: &str = "_etag";

/// Etag of a document as read from the collection
pub fn etag_of(document: &Map<String, Value>) -> Option<&str> {
    document.get(ETAG_FIELD).and_then(Value::as_str)
}

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Another writer changed the document since it was read
    Conflict,
}

/// A schema-less collection of transaction documents
///
/// Documents are JSON objects whose `id` is the transaction ID, scoped by
/// `account_id`.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Collection name for logging
    fn name(&self) -> &str;

    /// Read one document, `None` if absent
    async fn read(&self, key: &TransactionKey) -> Result<Option<Value>>;

    /// Create a document that must not exist yet
    async fn create(&self, key: &TransactionKey, document: Value) -> Result<WriteOutcome>;

    /// Replace an existing document
    ///
    /// With `etag` set, the write only lands if the stored document still
    /// carries it. A document deleted meanwhile is a conflict too.
    async fn replace(
        &self,
        key: &TransactionKey,
        document: Value,
        etag: Option<&str>,
    ) -> Result<WriteOutcome>;

    /// Documents matching the filter, ordered by `date` ascending
    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Value>>;

    /// Number of documents matching the filter
    async fn count(&self, filter: &TransactionFilter) -> Result<u64>;

    /// Largest stored `date` value of an account
    async fn latest_date(&self, account_id: &AccountId) -> Result<Option<String>>;
}
