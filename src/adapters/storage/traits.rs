//! Storage abstraction traits
//!
//! This module defines the contract every transaction storage backend
//! implements, along with the result types its operations report.

use crate::domain::ids::{TransactionId, TransactionKey};
use crate::domain::metadata::MetadataPatch;
use crate::domain::transaction::{StoredTransaction, Transaction};
use crate::domain::{Result, SyncError};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Result of a save operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Transactions written (inserted or updated)
    pub saved: usize,

    /// Of `saved`, transactions stored for the first time
    pub inserted: usize,

    /// Of `saved`, transactions whose core fields were refreshed
    pub updated: usize,

    /// Pending transactions that were not stored
    pub skipped_pending: usize,

    /// Transactions of another account than the one the storage is scoped to
    pub skipped_foreign: usize,

    /// Keys whose stored record is unreadable and was left as it is
    pub malformed: Vec<TransactionKey>,
}

impl SaveSummary {
    pub(crate) fn record_insert(&mut self) {
        self.saved += 1;
        self.inserted += 1;
    }

    pub(crate) fn record_update(&mut self) {
        self.saved += 1;
        self.updated += 1;
    }
}

/// A stored record that could not be decoded
#[derive(Debug)]
pub struct MalformedRecord {
    /// Key of the record, when it could be read
    pub key: Option<TransactionKey>,

    /// Transaction ID as stored
    pub transaction_id: String,

    /// Decoding error ([`SyncError::MalformedRecord`])
    pub error: SyncError,
}

/// Result of a transaction query
///
/// Records that fail to decode are reported in `malformed` instead of
/// failing the whole query.
#[derive(Debug, Default)]
pub struct FetchResult {
    /// Decoded transactions, ordered by date ascending
    pub transactions: Vec<StoredTransaction>,

    /// Records that could not be decoded
    pub malformed: Vec<MalformedRecord>,
}

impl FetchResult {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Records a row that failed to decode
    pub(crate) fn push_malformed(&mut self, key: Option<TransactionKey>, error: SyncError) {
        let transaction_id = match &error {
            SyncError::MalformedRecord { transaction_id, .. } => transaction_id.clone(),
            _ => "<unknown>".to_string(),
        };
        tracing::warn!(
            transaction_id = %transaction_id,
            error = %error,
            "Skipping malformed stored transaction"
        );
        self.malformed.push(MalformedRecord {
            key,
            transaction_id,
            error,
        });
    }
}

/// Result of a metadata update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Transactions whose metadata was updated
    pub updated: usize,

    /// Patches that matched no stored transaction
    pub missing: usize,

    /// Id-only patches whose transaction ID is stored under several accounts
    pub ambiguous: Vec<TransactionId>,

    /// Keys whose stored record is unreadable and was left as it is
    pub malformed: Vec<TransactionKey>,
}

impl UpdateSummary {
    /// Patches that were not applied
    pub fn unapplied(&self) -> usize {
        self.missing + self.ambiguous.len() + self.malformed.len()
    }
}

/// Transaction storage backend
///
/// Backends persist settled transactions keyed by `(account_id,
/// transaction_id)` and track which of them have been exported to a ledger
/// file. Re-saving a transaction refreshes its core fields but never resets its
/// export metadata.
#[async_trait]
pub trait TransactionStorage: Send + Sync {
    /// Short backend name used in logs and errors
    fn backend_name(&self) -> &'static str;

    /// Upsert settled transactions
    ///
    /// For each non-pending transaction, update the core fields if the key is
    /// already stored, otherwise insert it. Pending transactions are skipped,
    /// and so are transactions of another account when the storage can only
    /// read back its own ([`SaveSummary::skipped_foreign`]). A stored record that can't be decoded is reported in
    /// [`SaveSummary::malformed`] and the rest of the batch is still saved.
    ///
    /// # Errors
    ///
    /// A backend failure, or a write that keeps losing to a concurrent
    /// writer, aborts the call; records saved before it stay saved.
    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<SaveSummary>;

    /// Retrieve stored transactions ordered by date ascending
    ///
    /// # Arguments
    ///
    /// * `from_date` - Inclusive lower bound
    /// * `to_date` - Inclusive upper bound
    /// * `only_new` - Exclude transactions whose metadata has `pulled_to_file = true`
    async fn get_transactions(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        only_new: bool,
    ) -> Result<FetchResult>;

    /// Retrieve transactions not yet written to a ledger file
    async fn get_new_transactions(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<FetchResult> {
        self.get_transactions(from_date, to_date, true).await
    }

    /// Merge metadata patches into stored sidecars
    ///
    /// With `mark_pulled` set, `pulled_to_file` is set to its value; marking as
    /// pulled also stamps `date_last_pulled` with the current time. Patches
    /// that can't be applied are counted per patch in [`UpdateSummary`]
    /// without stopping the batch.
    async fn update_transaction(
        &self,
        updates: &[MetadataPatch],
        mark_pulled: Option<bool>,
    ) -> Result<UpdateSummary>;

    /// Whether any stored transaction is not yet written to a ledger file
    ///
    /// # Errors
    ///
    /// Backends that can't answer this return
    /// [`SyncError::UnsupportedOperation`].
    async fn check_pending(&self) -> Result<bool>;

    /// Date of the most recent stored transaction, `None` when empty
    async fn latest_transaction_date(&self) -> Result<Option<NaiveDate>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_summary_counters() {
        let mut summary = SaveSummary::default();
        summary.record_insert();
        summary.record_update();
        summary.record_update();
        assert_eq!(summary.saved, 3);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.updated, 2);
        assert!(summary.malformed.is_empty());
    }

    #[test]
    fn test_update_summary_unapplied() {
        let summary = UpdateSummary {
            updated: 2,
            missing: 1,
            ambiguous: vec![TransactionId::new("T1").unwrap()],
            malformed: Vec::new(),
        };
        assert_eq!(summary.unapplied(), 2);
    }

    #[test]
    fn test_fetch_result_tracks_malformed() {
        let mut result = FetchResult::default();
        result.push_malformed(None, SyncError::malformed("T7", "bad metadata"));
        assert!(result.is_empty());
        assert_eq!(result.malformed.len(), 1);
        assert_eq!(result.malformed[0].transaction_id, "T7");
    }
}
