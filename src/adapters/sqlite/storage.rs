//! Relational transaction storage on SQLite
//!
//! Core fields live in `core_json`; export metadata lives in `metadata_json`,
//! which stays NULL until the first metadata update. Saves never touch
//! `metadata_json` of an existing row.

use super::client::SqliteClient;
use crate::adapters::storage::{FetchResult, SaveSummary, TransactionStorage, UpdateSummary};
use crate::core::query::{Predicate, TransactionFilter};
use crate::domain::ids::{AccountId, TransactionId, TransactionKey};
use crate::domain::metadata::MetadataPatch;
use crate::domain::timestamp::{format_timestamp, parse_date, DATE_FORMAT};
use crate::domain::transaction::{StoredTransaction, Transaction};
use crate::domain::{Result, SyncError};
use crate::{log_batch_saved, log_metadata_updated};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;

const BACKEND: &str = "sqlite";

/// `date` of the core record; NULL for rows whose core JSON is unreadable
const DATE_EXPR: &str =
    "CASE WHEN json_valid(core_json) THEN json_extract(core_json, '$.date') END";

/// `pulled_to_file` of the metadata, 0 when absent
const PULLED_EXPR: &str = "coalesce(CASE WHEN json_valid(metadata_json) \
     THEN json_extract(metadata_json, '$.pulled_to_file') END, 0)";

const INSERT_SQL: &str = "
    INSERT INTO transactions (account_id, transaction_id, created, updated, core_json, metadata_json)
    VALUES (?1, ?2, ?3, ?3, ?4, NULL)
    ON CONFLICT (account_id, transaction_id) DO NOTHING
";

const REFRESH_CORE_SQL: &str = "
    UPDATE transactions SET updated = ?3, core_json = ?4
    WHERE account_id = ?1 AND transaction_id = ?2
";

const PATCH_METADATA_SQL: &str =
    "UPDATE transactions SET metadata_json = json_patch(coalesce(metadata_json, '{}'), ?1)";

/// How a single metadata patch landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchOutcome {
    Applied,
    Missing,
    /// The transaction ID is stored under this many accounts
    Ambiguous(i64),
}

/// A WHERE clause with its positional parameters
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct WhereClause {
    pub sql: String,
    pub params: Vec<String>,
}

pub(crate) fn render_where(filter: &TransactionFilter) -> WhereClause {
    let mut params = Vec::new();
    let clauses: Vec<String> = filter
        .predicates()
        .into_iter()
        .map(|predicate| match predicate {
            Predicate::AccountIs(account_id) => {
                params.push(account_id.into_inner());
                "account_id = ?".to_string()
            }
            Predicate::NotPulled => format!("{PULLED_EXPR} = 0"),
            Predicate::DateOnOrAfter(from) => {
                params.push(from.format(DATE_FORMAT).to_string());
                format!("{DATE_EXPR} >= ?")
            }
            Predicate::DateOnOrBefore(to) => {
                params.push(to.format(DATE_FORMAT).to_string());
                format!("{DATE_EXPR} <= ?")
            }
        })
        .collect();

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    WhereClause { sql, params }
}

/// Transaction storage on a SQLite database
pub struct SqliteStorage {
    client: SqliteClient,
    account_id: Option<AccountId>,
}

impl SqliteStorage {
    /// Creates a storage over an open database
    ///
    /// With `account_id` set, reads and id-only metadata updates are scoped to
    /// that account.
    pub fn new(client: SqliteClient, account_id: Option<AccountId>) -> Self {
        Self { client, account_id }
    }

    pub fn client(&self) -> &SqliteClient {
        &self.client
    }

    fn save_batch(&self, transactions: &[Transaction]) -> Result<SaveSummary> {
        let now = format_timestamp(&Utc::now());

        self.client.with_connection(|conn| {
            let mut summary = SaveSummary::default();
            let mut insert = conn.prepare(INSERT_SQL)?;
            let mut refresh = conn.prepare(REFRESH_CORE_SQL)?;

            for transaction in transactions {
                if transaction.pending {
                    tracing::debug!(
                        transaction_id = %transaction.transaction_id,
                        "Skipping pending transaction"
                    );
                    summary.skipped_pending += 1;
                    continue;
                }

                let account_id = transaction.account_id.as_str();
                let transaction_id = transaction.transaction_id.as_str();
                let core_json = serde_json::to_string(&transaction.to_map()?)?;

                // An existing row is left alone by the insert and refreshed after it
                if insert.execute(params![account_id, transaction_id, now, core_json])? == 1 {
                    summary.record_insert();
                } else {
                    refresh.execute(params![account_id, transaction_id, now, core_json])?;
                    summary.record_update();
                }
            }
            Ok(summary)
        })
    }

    fn fetch(&self, filter: &TransactionFilter) -> Result<FetchResult> {
        let clause = render_where(filter);
        let sql = format!(
            "SELECT account_id, transaction_id, core_json, metadata_json FROM transactions{} \
             ORDER BY {DATE_EXPR} ASC, transaction_id ASC",
            clause.sql
        );

        let rows = self.client.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(clause.params.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        let mut result = FetchResult::default();
        for (account_id, transaction_id, core_json, metadata_json) in rows {
            let key = row_key(&account_id, &transaction_id);
            match decode_row(&transaction_id, &core_json, metadata_json.as_deref()) {
                Ok(stored) => result.transactions.push(stored),
                Err(e) => result.push_malformed(key, e),
            }
        }
        Ok(result)
    }

    fn apply_patches(
        &self,
        updates: &[MetadataPatch],
        mark_pulled: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<UpdateSummary> {
        self.client.with_connection(|conn| {
            let mut summary = UpdateSummary::default();
            for patch in updates {
                let merge = patch.to_merge_document(mark_pulled, now).to_string();
                let account_id = patch.account_id().or(self.account_id.as_ref());

                let outcome = match account_id {
                    Some(account_id) => {
                        let changed = conn.execute(
                            &format!("{PATCH_METADATA_SQL} WHERE account_id = ?2 AND transaction_id = ?3"),
                            params![merge, account_id.as_str(), patch.transaction_id().as_str()],
                        )?;
                        if changed == 0 {
                            PatchOutcome::Missing
                        } else {
                            PatchOutcome::Applied
                        }
                    }
                    None => patch_by_transaction_id(conn, patch.transaction_id(), &merge)?,
                };

                match outcome {
                    PatchOutcome::Applied => summary.updated += 1,
                    PatchOutcome::Missing => {
                        tracing::warn!(
                            transaction_id = %patch.transaction_id(),
                            "No stored transaction matches metadata update"
                        );
                        summary.missing += 1;
                    }
                    PatchOutcome::Ambiguous(accounts) => {
                        tracing::warn!(
                            transaction_id = %patch.transaction_id(),
                            accounts,
                            "Metadata update without account matches several transactions"
                        );
                        summary.ambiguous.push(patch.transaction_id().clone());
                    }
                }
            }
            Ok(summary)
        })
    }

    fn latest_date(&self) -> Result<Option<NaiveDate>> {
        let clause = render_where(&TransactionFilter::default().scoped_to(self.account_id.as_ref()));
        let sql = format!("SELECT max({DATE_EXPR}) FROM transactions{}", clause.sql);

        let latest: Option<String> = self.client.with_connection(|conn| {
            Ok(conn
                .query_row(&sql, params_from_iter(clause.params.iter()), |row| row.get(0))
                .optional()?
                .flatten())
        })?;
        Ok(latest.as_deref().and_then(parse_date))
    }
}

/// Updates the single row carrying `transaction_id`, whatever its account
///
/// Nothing is written when the ID is stored under more than one account.
fn patch_by_transaction_id(
    conn: &Connection,
    transaction_id: &TransactionId,
    merge: &str,
) -> Result<PatchOutcome> {
    let matches: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE transaction_id = ?1",
        params![transaction_id.as_str()],
        |row| row.get(0),
    )?;
    match matches {
        0 => Ok(PatchOutcome::Missing),
        1 => {
            conn.execute(
                &format!("{PATCH_METADATA_SQL} WHERE transaction_id = ?2"),
                params![merge, transaction_id.as_str()],
            )?;
            Ok(PatchOutcome::Applied)
        }
        accounts => Ok(PatchOutcome::Ambiguous(accounts)),
    }
}

fn row_key(account_id: &str, transaction_id: &str) -> Option<TransactionKey> {
    Some(TransactionKey::new(
        AccountId::new(account_id).ok()?,
        TransactionId::new(transaction_id).ok()?,
    ))
}

fn decode_row(
    transaction_id: &str,
    core_json: &str,
    metadata_json: Option<&str>,
) -> Result<StoredTransaction> {
    let core: Value = serde_json::from_str(core_json)
        .map_err(|e| SyncError::malformed(transaction_id, format!("core_json: {e}")))?;
    let metadata = metadata_json
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|e| SyncError::malformed(transaction_id, format!("metadata_json: {e}")))?;
    StoredTransaction::from_parts(core, metadata)
}

#[async_trait]
impl TransactionStorage for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<SaveSummary> {
        let summary = self.save_batch(transactions)?;
        log_batch_saved!(BACKEND, &summary);
        Ok(summary)
    }

    async fn get_transactions(
        &self,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        only_new: bool,
    ) -> Result<FetchResult> {
        let filter =
            TransactionFilter::new(from_date, to_date, only_new).scoped_to(self.account_id.as_ref());
        let result = self.fetch(&filter)?;

        tracing::debug!(
            backend = BACKEND,
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
        let summary = self.apply_patches(updates, mark_pulled, Utc::now())?;
        log_metadata_updated!(BACKEND, &summary, mark_pulled);
        Ok(summary)
    }

    async fn check_pending(&self) -> Result<bool> {
        Err(SyncError::UnsupportedOperation {
            backend: BACKEND,
            operation: "check_pending",
        })
    }

    async fn latest_transaction_date(&self) -> Result<Option<NaiveDate>> {
        self.latest_date()
    }
}
