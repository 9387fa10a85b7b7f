//! Document-store transaction storage
//!
//! Each transaction is one document; the export metadata lives in its
//! `plaid2text` sub-document. Saves read the current document and write it
//! back with the core fields replaced, so the metadata of a re-saved
//! transaction is never reset. Every write is conditional on the etag that
//! was read; a write that loses to another writer is re-read and retried
//! once before the call fails.

use super::collection::{etag_of, DocumentCollection, WriteOutcome};
use super::models::{core_document, document_key, from_document, new_document, overlay_core};
use crate::adapters::storage::{FetchResult, SaveSummary, TransactionStorage, UpdateSummary};
use crate::core::patch::merge_patch;
use crate::core::query::TransactionFilter;
use crate::domain::ids::{AccountId, TransactionKey};
use crate::domain::metadata::{MetadataPatch, METADATA_FIELD};
use crate::domain::timestamp::parse_date;
use crate::domain::transaction::Transaction;
use crate::domain::{Result, SyncError};
use crate::{log_batch_saved, log_metadata_updated};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

/// Read-modify-write rounds before a lost write is reported
const WRITE_ATTEMPTS: usize = 2;

/// What a save did with one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Saved {
    Inserted,
    Updated,
    /// The stored document is not an object and was left alone
    Malformed,
}

/// What an update did with one patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Patched {
    Applied,
    Missing,
    Malformed,
}

fn lost_write(key: &TransactionKey) -> SyncError {
    SyncError::ConstraintViolation(format!(
        "{key} was changed by another writer on every attempt"
    ))
}

/// Transaction storage over a document collection, scoped to one account
pub struct DocumentStorage<C> {
    collection: C,
    account_id: AccountId,
}

impl<C: DocumentCollection> DocumentStorage<C> {
    /// Creates a storage for the transactions of `account_id`
    pub fn new(collection: C, account_id: AccountId) -> Self {
        Self {
            collection,
            account_id,
        }
    }

    /// The underlying collection
    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn scoped(&self, filter: TransactionFilter) -> TransactionFilter {
        filter.scoped_to(Some(&self.account_id))
    }

    async fn save_one(
        &self,
        key: &TransactionKey,
        core: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Saved> {
        for _ in 0..WRITE_ATTEMPTS {
            let (saved, outcome) = match self.collection.read(key).await? {
                Some(Value::Object(mut existing)) => {
                    let etag = etag_of(&existing).map(str::to_string);
                    overlay_core(&mut existing, core.clone());
                    let outcome = self
                        .collection
                        .replace(key, Value::Object(existing), etag.as_deref())
                        .await?;
                    (Saved::Updated, outcome)
                }
                Some(_) => return Ok(Saved::Malformed),
                None => {
                    let document = new_document(core.clone(), now)?;
                    (Saved::Inserted, self.collection.create(key, document).await?)
                }
            };

            if outcome == WriteOutcome::Written {
                return Ok(saved);
            }
            tracing::debug!(%key, "Document changed while saving, retrying");
        }
        Err(lost_write(key))
    }

    async fn apply_patch(
        &self,
        patch: &MetadataPatch,
        mark_pulled: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<Patched> {
        let account_id = patch.account_id().unwrap_or(&self.account_id).clone();
        let key = TransactionKey::new(account_id, patch.transaction_id().clone());
        let merge = patch.to_merge_document(mark_pulled, now);

        for _ in 0..WRITE_ATTEMPTS {
            let Some(document) = self.collection.read(&key).await? else {
                return Ok(Patched::Missing);
            };
            let Value::Object(mut document) = document else {
                return Ok(Patched::Malformed);
            };
            let etag = etag_of(&document).map(str::to_string);

            let mut metadata = match document.remove(METADATA_FIELD) {
                Some(existing @ Value::Object(_)) => existing,
                _ => Value::Object(Map::new()),
            };
            merge_patch(&mut metadata, &merge);
            document.insert(METADATA_FIELD.to_string(), metadata);

            let outcome = self
                .collection
                .replace(&key, Value::Object(document), etag.as_deref())
                .await?;
            if outcome == WriteOutcome::Written {
                return Ok(Patched::Applied);
            }
            tracing::debug!(%key, "Document changed while updating metadata, retrying");
        }
        Err(lost_write(&key))
    }
}

#[async_trait]
impl<C: DocumentCollection> TransactionStorage for DocumentStorage<C> {
    fn backend_name(&self) -> &'static str {
        "document"
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<SaveSummary> {
        let mut summary = SaveSummary::default();
        let now = Utc::now();

        for transaction in transactions {
            if transaction.pending {
                tracing::debug!(
                    transaction_id = %transaction.transaction_id,
                    "Skipping pending transaction"
                );
                summary.skipped_pending += 1;
                continue;
            }

            if transaction.account_id != self.account_id {
                tracing::warn!(
                    transaction_id = %transaction.transaction_id,
                    account_id = %transaction.account_id,
                    scoped_to = %self.account_id,
                    "Skipping transaction of another account"
                );
                summary.skipped_foreign += 1;
                continue;
            }

            let key = transaction.key();
            let core = core_document(transaction)?;

            match self.save_one(&key, &core, now).await? {
                Saved::Inserted => summary.record_insert(),
                Saved::Updated => summary.record_update(),
                Saved::Malformed => {
                    tracing::warn!(%key, "Stored document is not an object, left as it is");
                    summary.malformed.push(key);
                }
            }
        }

        log_batch_saved!(self.collection.name(), &summary);
        Ok(summary)
    }

    async fn get_transactions(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        only_new: bool,
    ) -> Result<FetchResult> {
        let filter = self.scoped(TransactionFilter::new(from_date, to_date, only_new));
        let documents = self.collection.query(&filter).await?;

        let mut result = FetchResult::default();
        for document in documents {
            let key = document_key(&document);
            match from_document(document) {
                Ok(stored) => result.transactions.push(stored),
                Err(e) => result.push_malformed(key, e),
            }
        }

        tracing::debug!(
            collection = self.collection.name(),
            count = result.len(),
            malformed = result.malformed.len(),
            only_new,
            "Fetched transactions"
        );
        Ok(result)
    }

    async fn update_transaction(
        &self,
        updates: &[MetadataPatch],
        mark_pulled: Option<bool>,
    ) -> Result<UpdateSummary> {
        let mut summary = UpdateSummary::default();
        let now = Utc::now();

        for patch in updates {
            match self.apply_patch(patch, mark_pulled, now).await? {
                Patched::Applied => summary.updated += 1,
                Patched::Missing => {
                    tracing::warn!(
                        transaction_id = %patch.transaction_id(),
                        "No stored transaction matches metadata update"
                    );
                    summary.missing += 1;
                }
                Patched::Malformed => {
                    let account_id = patch.account_id().unwrap_or(&self.account_id).clone();
                    let key = TransactionKey::new(account_id, patch.transaction_id().clone());
                    tracing::warn!(%key, "Stored document is not an object, metadata not updated");
                    summary.malformed.push(key);
                }
            }
        }

        log_metadata_updated!(self.collection.name(), &summary, mark_pulled);
        Ok(summary)
    }

    async fn check_pending(&self) -> Result<bool> {
        let count = self
            .collection
            .count(&self.scoped(TransactionFilter::unpulled()))
            .await?;
        Ok(count > 0)
    }

    async fn latest_transaction_date(&self) -> Result<Option<NaiveDate>> {
        let latest = self.collection.latest_date(&self.account_id).await?;
        Ok(latest.as_deref().and_then(parse_date))
    }
}
