//! Transaction document shape
//!
//! One document per transaction: `id` (the transaction ID), the core fields
//! at top level with `date` and `authorized_date` as midnight UTC timestamps,
//! and the `plaid2text` metadata sub-document.

use crate::domain::errors::SyncError;
use crate::domain::ids::{AccountId, TransactionId, TransactionKey};
use crate::domain::metadata::{ExportMetadata, METADATA_FIELD};
use crate::domain::timestamp::{midnight_timestamp, parse_date, DATE_FORMAT};
use crate::domain::transaction::{StoredTransaction, Transaction};
use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

const DATE_FIELDS: [&str; 2] = ["date", "authorized_date"];

/// Core fields of a transaction in document form
///
/// An `authorized_date` that is null or unparseable is left out, so an upsert
/// never fails (or clears a stored value) because of it.
pub fn core_document(transaction: &Transaction) -> Result<Map<String, Value>> {
    let mut document = transaction.to_map()?;
    document.insert(
        "id".to_string(),
        Value::String(transaction.transaction_id.to_string()),
    );

    for field in DATE_FIELDS {
        let normalized = document
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_date)
            .map(midnight_timestamp);

        match normalized {
            Some(ts) => {
                document.insert(field.to_string(), Value::String(ts));
            }
            None if field == "date" => {
                return Err(SyncError::Validation(format!(
                    "transaction {} has no usable date",
                    transaction.transaction_id
                )));
            }
            None => {
                document.remove(field);
            }
        }
    }

    Ok(document)
}

/// Document for a transaction stored for the first time
pub fn new_document(core: Map<String, Value>, now: DateTime<Utc>) -> Result<Value> {
    let mut document = core;
    document.insert(
        METADATA_FIELD.to_string(),
        ExportMetadata::initial(now).to_value()?,
    );
    Ok(Value::Object(document))
}

/// Sets every core field on an existing document, keeping its metadata
pub fn overlay_core(existing: &mut Map<String, Value>, core: Map<String, Value>) {
    for (field, value) in core {
        existing.insert(field, value);
    }
}

/// Natural key of a raw document, if it carries one
pub fn document_key(document: &Value) -> Option<TransactionKey> {
    let account_id = AccountId::new(document.get("account_id")?.as_str()?).ok()?;
    let transaction_id = TransactionId::new(
        document
            .get("transaction_id")
            .or_else(|| document.get("id"))?
            .as_str()?,
    )
    .ok()?;
    Some(TransactionKey::new(account_id, transaction_id))
}

/// Decodes a stored document
///
/// Store bookkeeping fields (`id`, `_rid`, `_etag`, ...) are dropped and the
/// midnight timestamps turned back into calendar dates.
pub fn from_document(document: Value) -> Result<StoredTransaction> {
    let Value::Object(mut fields) = document else {
        return Err(SyncError::malformed("<unknown>", "document is not an object"));
    };

    let metadata = fields.remove(METADATA_FIELD);
    fields.remove("id");
    fields.retain(|key, _| !key.starts_with('_'));

    for field in DATE_FIELDS {
        let date = fields
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_date)
            .map(|d| d.format(DATE_FORMAT).to_string());
        if let Some(date) = date {
            fields.insert(field.to_string(), Value::String(date));
        }
    }

    StoredTransaction::from_parts(Value::Object(fields), metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::fixtures::transaction;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    #[test]
    fn test_core_document_normalizes_dates() {
        let mut txn = transaction("A1", "T1", "2024-01-05", 12.5);
        txn.authorized_date = NaiveDate::from_ymd_opt(2024, 1, 4);

        let doc = core_document(&txn).unwrap();
        assert_eq!(doc["id"], json!("T1"));
        assert_eq!(doc["date"], json!("2024-01-05T00:00:00Z"));
        assert_eq!(doc["authorized_date"], json!("2024-01-04T00:00:00Z"));
        assert!(doc.get(METADATA_FIELD).is_none());
    }

    #[test]
    fn test_core_document_leaves_missing_authorized_date_unset() {
        let txn = transaction("A1", "T1", "2024-01-05", 40.0);
        let doc = core_document(&txn).unwrap();
        assert!(!doc.contains_key("authorized_date"));
    }

    #[test]
    fn test_overlay_keeps_metadata() {
        let now = Utc.with_ymd_and_hms(2024, 1, 6, 8, 0, 0).unwrap();
        let first = core_document(&transaction("A1", "T1", "2024-01-05", 10.0)).unwrap();
        let Value::Object(mut stored) = new_document(first, now).unwrap() else {
            panic!("document is an object");
        };

        let second = core_document(&transaction("A1", "T1", "2024-01-05", 11.0)).unwrap();
        overlay_core(&mut stored, second);

        assert_eq!(stored["amount"], json!(11.0));
        assert_eq!(
            stored[METADATA_FIELD]["date_downloaded"],
            json!("2024-01-06T08:00:00Z")
        );
    }

    #[test]
    fn test_from_document_round_trip() {
        let now = Utc.with_ymd_and_hms(2024, 1, 6, 8, 0, 0).unwrap();
        let txn = transaction("A1", "T1", "2024-01-05", 12.5);
        let mut doc = new_document(core_document(&txn).unwrap(), now).unwrap();
        doc["_etag"] = json!("\"0000\"");
        doc["_ts"] = json!(1704528000);

        let stored = from_document(doc).unwrap();
        assert_eq!(stored.transaction, txn);
        let metadata = stored.metadata.unwrap();
        assert_eq!(metadata.date_downloaded, Some(now));
        assert!(!metadata.pulled_to_file);
    }

    #[test]
    fn test_document_key() {
        let doc = json!({"id": "T1", "account_id": "A1"});
        assert_eq!(document_key(&doc).unwrap().to_string(), "A1/T1");
        assert!(document_key(&json!({"id": "T1"})).is_none());
    }
}
