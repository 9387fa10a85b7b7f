//! Export coordinator
//!
//! Drives one download or export cycle against a [`TransactionStorage`]. An
//! export fetches the unexported transactions, hands them to a
//! [`LedgerRenderer`] and marks them as pulled only once the renderer has
//! returned successfully, so a failed render leaves them for the next run.

use crate::adapters::storage::{SaveSummary, TransactionStorage};
use crate::core::export::summary::ExportSummary;
use crate::domain::ids::TransactionKey;
use crate::domain::metadata::MetadataPatch;
use crate::domain::transaction::{StoredTransaction, Transaction};
use crate::domain::upstream::PlaidTransaction;
use crate::domain::Result;
use crate::{log_error_with_context, log_export_complete};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;

/// Writes transactions to a text ledger
///
/// Returns one metadata patch per transaction written, carrying whatever
/// the renderer decided (payee, posting account, tags). Patches may name
/// their account with [`MetadataPatch::in_account`]; id-only patches are
/// paired with the rendered records by transaction ID.
pub trait LedgerRenderer {
    fn render(&mut self, transactions: &[StoredTransaction]) -> Result<Vec<MetadataPatch>>;
}

/// Export coordinator
pub struct ExportCoordinator {
    storage: Arc<dyn TransactionStorage>,
}

impl ExportCoordinator {
    pub fn new(storage: Arc<dyn TransactionStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn TransactionStorage> {
        &self.storage
    }

    /// Stores a batch of downloaded transactions
    pub async fn download(&self, transactions: &[Transaction]) -> Result<SaveSummary> {
        self.storage.save_transactions(transactions).await
    }

    /// Stores a batch of upstream transaction objects
    pub async fn download_upstream(&self, transactions: &[PlaidTransaction]) -> Result<SaveSummary> {
        let records: Vec<Transaction> = transactions.iter().map(Transaction::from).collect();
        self.download(&records).await
    }

    /// Renders every unexported transaction in the range and marks it pulled
    ///
    /// # Errors
    ///
    /// A renderer error is returned as is and nothing is marked.
    pub async fn export<R>(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        renderer: &mut R,
    ) -> Result<ExportSummary>
    where
        R: LedgerRenderer + ?Sized,
    {
        let start = Instant::now();
        let fetched = self.storage.get_new_transactions(from_date, to_date).await?;

        let mut summary = ExportSummary {
            fetched: fetched.len(),
            malformed: fetched
                .malformed
                .iter()
                .map(|m| m.transaction_id.clone())
                .collect(),
            ..Default::default()
        };

        if !fetched.is_empty() {
            let patches = renderer.render(&fetched.transactions).map_err(|e| {
                log_error_with_context!(&e, "Ledger render failed, nothing marked");
                e
            })?;
            summary.rendered = patches.len();

            let patches = assign_accounts(patches, &fetched.transactions);

            let updated = self.storage.update_transaction(&patches, Some(true)).await?;
            summary.marked = updated.updated;
            summary.missing = updated.unapplied();
        }

        let summary = summary.with_duration(start.elapsed());
        log_export_complete!(summary.marked, summary.duration);
        Ok(summary)
    }

    /// Whether any stored transaction is still unexported
    ///
    /// Backends without a pending check are answered with a fetch.
    pub async fn has_unexported(&self) -> Result<bool> {
        match self.storage.check_pending().await {
            Err(e) if e.is_unsupported() => {
                tracing::debug!(
                    backend = self.storage.backend_name(),
                    "Pending check unsupported, fetching unexported transactions"
                );
                Ok(!self.storage.get_new_transactions(None, None).await?.is_empty())
            }
            other => other,
        }
    }
}

/// Pairs id-only patches with the fetched records they were rendered from
///
/// Each fetched key is claimed at most once, in fetch order, so records that
/// share a transaction ID across accounts each get their own patch. A patch
/// with no unclaimed record left keeps no account.
fn assign_accounts(patches: Vec<MetadataPatch>, fetched: &[StoredTransaction]) -> Vec<MetadataPatch> {
    let mut open: Vec<TransactionKey> = fetched.iter().map(StoredTransaction::key).collect();
    open.retain(|key| {
        !patches.iter().any(|p| {
            p.account_id() == Some(&key.account_id) && p.transaction_id() == &key.transaction_id
        })
    });

    patches
        .into_iter()
        .map(|patch| {
            if patch.account_id().is_some() {
                return patch;
            }
            match open
                .iter()
                .position(|key| &key.transaction_id == patch.transaction_id())
            {
                Some(index) => {
                    let key = open.remove(index);
                    patch.in_account(key.account_id)
                }
                None => patch,
            }
        })
        .collect()
}
