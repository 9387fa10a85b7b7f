//! Transaction record model
//!
//! A [`Transaction`] holds the upstream-sourced core fields. What a backend
//! hands back is a [`StoredTransaction`]: the core fields plus the export
//! metadata sidecar, which is `None` when it was never written.

use crate::domain::errors::SyncError;
use crate::domain::ids::{AccountId, TransactionId, TransactionKey};
use crate::domain::metadata::ExportMetadata;
use crate::domain::timestamp::{lenient_date, optional_timestamp};
use crate::domain::upstream::PlaidTransaction;
use crate::domain::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Core transaction fields as sourced from the aggregation API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub account_id: AccountId,
    pub transaction_id: TransactionId,
    pub amount: f64,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub category_id: Option<String>,
    pub date: NaiveDate,
    /// Absent for some transaction kinds (e.g. ATM withdrawals)
    #[serde(default, with = "lenient_date")]
    pub authorized_date: Option<NaiveDate>,
    #[serde(default, with = "optional_timestamp")]
    pub datetime: Option<DateTime<Utc>>,
    pub name: String,
    pub pending: bool,
    #[serde(default)]
    pub pending_transaction_id: Option<String>,
    #[serde(default)]
    pub account_owner: Option<String>,
    pub payment_channel: String,
}

impl Transaction {
    /// Natural key `(account_id, transaction_id)`
    pub fn key(&self) -> TransactionKey {
        TransactionKey::new(self.account_id.clone(), self.transaction_id.clone())
    }

    /// Plain key-value mapping used for persistence
    ///
    /// Nullable fields are present with an explicit `null`.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(SyncError::Serialization(format!(
                "transaction serialized to non-object: {other}"
            ))),
        }
    }

    /// Decodes a persisted core mapping
    pub fn from_value(value: Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl From<&PlaidTransaction> for Transaction {
    fn from(upstream: &PlaidTransaction) -> Self {
        Self {
            account_id: upstream.account_id.clone(),
            transaction_id: upstream.transaction_id.clone(),
            amount: upstream.amount,
            iso_currency_code: upstream.iso_currency_code.clone(),
            category: upstream.category.clone(),
            category_id: upstream.category_id.clone(),
            date: upstream.date,
            authorized_date: upstream.authorized_date,
            datetime: upstream.datetime,
            name: upstream.name.clone(),
            pending: upstream.pending,
            pending_transaction_id: upstream.pending_transaction_id.clone(),
            account_owner: upstream.account_owner.clone(),
            payment_channel: upstream.payment_channel.clone(),
        }
    }
}

impl From<PlaidTransaction> for Transaction {
    fn from(upstream: PlaidTransaction) -> Self {
        Transaction::from(&upstream)
    }
}

/// A transaction as read back from storage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,

    /// Export metadata; `None` means the sidecar was never written
    #[serde(rename = "plaid2text")]
    pub metadata: Option<ExportMetadata>,
}

impl StoredTransaction {
    /// Decodes a stored record from its core and metadata parts
    ///
    /// An empty or null metadata value decodes as `None`. Either part failing
    /// to decode yields [`SyncError::MalformedRecord`].
    pub fn from_parts(core: Value, metadata: Option<Value>) -> Result<Self> {
        let transaction_id = core
            .get("transaction_id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();

        let transaction = Transaction::from_value(core)
            .map_err(|e| SyncError::malformed(&transaction_id, format!("core fields: {e}")))?;

        let metadata = match metadata {
            Some(value) => ExportMetadata::from_stored(value)
                .map_err(|e| SyncError::malformed(&transaction_id, format!("metadata: {e}")))?,
            None => None,
        };

        Ok(Self {
            transaction,
            metadata,
        })
    }

    /// Whether the transaction has been written to a ledger file
    pub fn is_pulled(&self) -> bool {
        self.metadata
            .as_ref()
            .map(|m| m.pulled_to_file)
            .unwrap_or(false)
    }

    pub fn key(&self) -> TransactionKey {
        self.transaction.key()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Settled transaction with the given key, date and amount
    pub fn transaction(account: &str, id: &str, date: &str, amount: f64) -> Transaction {
        Transaction {
            account_id: AccountId::new(account).unwrap(),
            transaction_id: TransactionId::new(id).unwrap(),
            amount,
            iso_currency_code: Some("USD".to_string()),
            category: Some(vec!["Food and Drink".to_string()]),
            category_id: Some("13005000".to_string()),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            authorized_date: None,
            datetime: None,
            name: format!("Merchant {id}"),
            pending: false,
            pending_transaction_id: None,
            account_owner: None,
            payment_channel: "in store".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::transaction;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_map_has_explicit_nulls() {
        let map = transaction("A1", "T1", "2024-01-05", 12.5).to_map().unwrap();
        assert_eq!(map.get("date"), Some(&json!("2024-01-05")));
        assert_eq!(map.get("authorized_date"), Some(&Value::Null));
        assert_eq!(map.get("datetime"), Some(&Value::Null));
        assert_eq!(map.get("account_owner"), Some(&Value::Null));
        assert_eq!(map.get("amount"), Some(&json!(12.5)));
    }

    #[test]
    fn test_from_upstream() {
        let upstream = PlaidTransaction::from_json(json!({
            "account_id": "A1",
            "transaction_id": "T1",
            "amount": 12.5,
            "date": "2024-01-05",
            "name": "Corner Cafe",
            "pending": false,
            "payment_channel": "in store"
        }))
        .unwrap();

        let txn = Transaction::from(&upstream);
        assert_eq!(txn.key().to_string(), "A1/T1");
        assert_eq!(txn.name, "Corner Cafe");
    }

    #[test]
    fn test_from_parts_empty_metadata_is_absent() {
        let core = Value::Object(transaction("A1", "T1", "2024-01-05", 1.0).to_map().unwrap());
        let stored = StoredTransaction::from_parts(core.clone(), Some(json!({}))).unwrap();
        assert!(stored.metadata.is_none());
        assert!(!stored.is_pulled());

        let stored = StoredTransaction::from_parts(core, None).unwrap();
        assert!(stored.metadata.is_none());
    }

    #[test]
    fn test_from_parts_malformed_metadata() {
        let core = Value::Object(transaction("A1", "T9", "2024-01-05", 1.0).to_map().unwrap());
        let err = StoredTransaction::from_parts(core, Some(json!("not an object"))).unwrap_err();
        match err {
            SyncError::MalformedRecord { transaction_id, .. } => assert_eq!(transaction_id, "T9"),
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn test_stored_transaction_serializes_sidecar() {
        let core = Value::Object(transaction("A1", "T1", "2024-01-05", 1.0).to_map().unwrap());
        let stored =
            StoredTransaction::from_parts(core, Some(json!({"pulled_to_file": true}))).unwrap();
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["transaction_id"], json!("T1"));
        assert_eq!(value["plaid2text"]["pulled_to_file"], json!(true));
        assert!(stored.is_pulled());
    }
}
