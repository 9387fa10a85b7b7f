//! In-process document collection
//!
//! Holds documents in a map behind an async lock. Used for tests and local
//! dry runs; filtering follows the same rules as the Cosmos DB queries and
//! every write stamps a fresh `_etag` the way the service does.

use super::collection::{DocumentCollection, WriteOutcome, ETAG_FIELD};
use crate::core::query::{Predicate, TransactionFilter};
use crate::domain::ids::{AccountId, TransactionKey};
use crate::domain::metadata::METADATA_FIELD;
use crate::domain::timestamp::midnight_timestamp;
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

type DocumentMap = BTreeMap<(String, String), Value>;

/// Document collection kept in memory
#[derive(Debug, Default)]
pub struct MemoryCollection {
    name: String,
    documents: RwLock<DocumentMap>,
    version: AtomicU64,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
            version: AtomicU64::new(0),
        }
    }

    /// Checks the document shape and gives it the next etag
    fn stamp(&self, key: &TransactionKey, document: Value) -> Result<Value> {
        let Value::Object(mut fields) = document else {
            return Err(SyncError::Validation(format!(
                "document for {key} is not an object"
            )));
        };
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        fields.insert(ETAG_FIELD.to_string(), Value::String(format!("\"{version:08x}\"")));
        Ok(Value::Object(fields))
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn map_key(key: &TransactionKey) -> (String, String) {
    (
        key.account_id.as_str().to_string(),
        key.transaction_id.as_str().to_string(),
    )
}

fn date_of(document: &Value) -> Option<&str> {
    document.get("date").and_then(Value::as_str)
}

fn matches(predicate: &Predicate, document: &Value) -> bool {
    match predicate {
        Predicate::AccountIs(account_id) => {
            document.get("account_id").and_then(Value::as_str) == Some(account_id.as_str())
        }
        Predicate::NotPulled => {
            let pulled = document
                .get(METADATA_FIELD)
                .and_then(|m| m.get("pulled_to_file"));
            pulled != Some(&Value::Bool(true))
        }
        Predicate::DateOnOrAfter(from) => {
            date_of(document).is_some_and(|d| d >= midnight_timestamp(*from).as_str())
        }
        Predicate::DateOnOrBefore(to) => {
            date_of(document).is_some_and(|d| d <= midnight_timestamp(*to).as_str())
        }
    }
}

fn select<'a>(documents: &'a DocumentMap, filter: &TransactionFilter) -> Vec<&'a Value> {
    let predicates = filter.predicates();
    documents
        .values()
        .filter(|doc| predicates.iter().all(|p| matches(p, doc)))
        .collect()
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &TransactionKey) -> Result<Option<Value>> {
        Ok(self.documents.read().await.get(&map_key(key)).cloned())
    }

    async fn create(&self, key: &TransactionKey, document: Value) -> Result<WriteOutcome> {
        let document = self.stamp(key, document)?;
        match self.documents.write().await.entry(map_key(key)) {
            Entry::Occupied(_) => Ok(WriteOutcome::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(WriteOutcome::Written)
            }
        }
    }

    async fn replace(
        &self,
        key: &TransactionKey,
        document: Value,
        etag: Option<&str>,
    ) -> Result<WriteOutcome> {
        let document = self.stamp(key, document)?;
        let mut documents = self.documents.write().await;
        let Some(current) = documents.get_mut(&map_key(key)) else {
            return Ok(WriteOutcome::Conflict);
        };
        if etag.is_some() && current.get(ETAG_FIELD).and_then(Value::as_str) != etag {
            return Ok(WriteOutcome::Conflict);
        }
        *current = document;
        Ok(WriteOutcome::Written)
    }

    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Value>> {
        let documents = self.documents.read().await;
        let mut selected = select(&documents, filter);
        // Map order already breaks date ties by (account_id, transaction_id)
        selected.sort_by(|a, b| date_of(a).cmp(&date_of(b)));
        Ok(selected.into_iter().cloned().collect())
    }

    async fn count(&self, filter: &TransactionFilter) -> Result<u64> {
        let documents = self.documents.read().await;
        Ok(select(&documents, filter).len() as u64)
    }

    async fn latest_date(&self, account_id: &AccountId) -> Result<Option<String>> {
        let documents = self.documents.read().await;
        let filter = TransactionFilter::default().scoped_to(Some(account_id));
        Ok(select(&documents, &filter)
            .into_iter()
            .filter_map(date_of)
            .max()
            .map(str::to_string))
    }
}
