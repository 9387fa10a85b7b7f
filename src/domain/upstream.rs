//! Upstream aggregation object shapes
//!
//! These mirror the JSON objects returned by the aggregation API client for
//! transactions, accounts and items. The client itself lives outside this
//! crate; ledgersync only consumes already-fetched objects.
//!
//! Required fields are non-optional, so parsing an object that lacks one
//! fails with [`SyncError::Validation`] naming the field.

use crate::domain::errors::SyncError;
use crate::domain::ids::{AccountId, TransactionId};
use crate::domain::timestamp::{lenient_date, optional_timestamp};
use crate::domain::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn parse_upstream<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| SyncError::Validation(format!("Invalid upstream {kind}: {e}")))
}

/// Upstream transaction object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaidTransaction {
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

impl PlaidTransaction {
    /// Parses a transaction object from the client's JSON
    pub fn from_json(value: Value) -> Result<Self> {
        parse_upstream("transaction", value)
    }
}

/// Balance block of an upstream account
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountBalances {
    #[serde(default)]
    pub available: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub iso_currency_code: Option<String>,
    #[serde(default)]
    pub unofficial_currency_code: Option<String>,
}

/// Upstream account summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaidAccount {
    pub account_id: AccountId,
    pub balances: AccountBalances,
    #[serde(default)]
    pub mask: Option<String>,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub persistent_account_id: Option<String>,
}

impl PlaidAccount {
    /// Parses an account object from the client's JSON
    pub fn from_json(value: Value) -> Result<Self> {
        parse_upstream("account", value)
    }
}

/// Upstream item (institution connection) metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaidItem {
    pub item_id: String,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(default)]
    pub available_products: Vec<String>,
    #[serde(default)]
    pub billed_products: Vec<String>,
    #[serde(default, with = "optional_timestamp")]
    pub consent_expiration_time: Option<DateTime<Utc>>,
    pub update_type: String,
    #[serde(default)]
    pub institution_id: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

impl PlaidItem {
    /// Parses an item object from the client's JSON
    pub fn from_json(value: Value) -> Result<Self> {
        parse_upstream("item", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_from_json() {
        let txn = PlaidTransaction::from_json(json!({
            "account_id": "A1",
            "transaction_id": "T1",
            "amount": 12.5,
            "iso_currency_code": "USD",
            "category": ["Food and Drink", "Restaurants"],
            "category_id": "13005000",
            "date": "2024-01-05",
            "authorized_date": "2024-01-04",
            "datetime": null,
            "name": "Corner Cafe",
            "pending": false,
            "pending_transaction_id": null,
            "account_owner": null,
            "payment_channel": "in store"
        }))
        .unwrap();

        assert_eq!(txn.transaction_id.as_str(), "T1");
        assert_eq!(txn.authorized_date, NaiveDate::from_ymd_opt(2024, 1, 4));
        assert!(txn.datetime.is_none());
    }

    #[test]
    fn test_transaction_missing_required_field() {
        let result = PlaidTransaction::from_json(json!({
            "account_id": "A1",
            "amount": 1.0,
            "date": "2024-01-05",
            "name": "x",
            "pending": false,
            "payment_channel": "other"
        }));

        match result {
            Err(SyncError::Validation(msg)) => assert!(msg.contains("transaction_id")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_authorized_date_is_dropped() {
        let txn = PlaidTransaction::from_json(json!({
            "account_id": "A1",
            "transaction_id": "T1",
            "amount": 40.0,
            "date": "2024-01-05",
            "authorized_date": "sometime",
            "name": "ATM",
            "pending": false,
            "payment_channel": "other"
        }))
        .unwrap();

        assert!(txn.authorized_date.is_none());
    }

    #[test]
    fn test_item_consent_expiration_nullable() {
        let item = PlaidItem::from_json(json!({
            "item_id": "item-1",
            "update_type": "background",
            "consent_expiration_time": null
        }))
        .unwrap();
        assert!(item.consent_expiration_time.is_none());
        assert!(item.products.is_empty());
    }
}
