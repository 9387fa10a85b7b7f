//! Upstream object to record mappings
//!
//! Every mapping is total: optional upstream fields always appear in the
//! output, as `null` when absent.

use crate::domain::timestamp::{format_timestamp, DATE_FORMAT};
use crate::domain::upstream::{AccountBalances, PlaidAccount, PlaidItem, PlaidTransaction};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};

fn date_value(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, |d| Value::String(d.format(DATE_FORMAT).to_string()))
}

fn timestamp_value(timestamp: Option<&DateTime<Utc>>) -> Value {
    timestamp.map_or(Value::Null, |ts| Value::String(format_timestamp(ts)))
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Normalized transaction record
pub fn serialize_transaction(transaction: &PlaidTransaction) -> Map<String, Value> {
    into_map(json!({
        "account_id": transaction.account_id.as_str(),
        "transaction_id": transaction.transaction_id.as_str(),
        "amount": transaction.amount,
        "iso_currency_code": transaction.iso_currency_code,
        "category": transaction.category,
        "category_id": transaction.category_id,
        "date": date_value(Some(transaction.date)),
        "authorized_date": date_value(transaction.authorized_date),
        "datetime": timestamp_value(transaction.datetime.as_ref()),
        "name": transaction.name,
        "pending": transaction.pending,
        "pending_transaction_id": transaction.pending_transaction_id,
        "account_owner": transaction.account_owner,
        "payment_channel": transaction.payment_channel,
    }))
}

fn serialize_balances(balances: &AccountBalances) -> Value {
    json!({
        "available": balances.available,
        "current": balances.current,
        "limit": balances.limit,
        "iso_currency_code": balances.iso_currency_code,
        "unofficial_currency_code": balances.unofficial_currency_code,
    })
}

/// Account summary record
pub fn serialize_account(account: &PlaidAccount) -> Map<String, Value> {
    into_map(json!({
        "account_id": account.account_id.as_str(),
        "balances": serialize_balances(&account.balances),
        "mask": account.mask,
        "name": account.name,
        "official_name": account.official_name,
        "type": account.account_type,
        "subtype": account.subtype,
        "verification_status": account.verification_status,
        "persistent_account_id": account.persistent_account_id,
    }))
}

/// Item (institution connection) record
pub fn serialize_item(item: &PlaidItem) -> Map<String, Value> {
    into_map(json!({
        "item_id": item.item_id,
        "webhook": item.webhook,
        "available_products": item.available_products,
        "billed_products": item.billed_products,
        "consent_expiration_time": timestamp_value(item.consent_expiration_time.as_ref()),
        "update_type": item.update_type,
        "institution_id": item.institution_id,
        "products": item.products,
    }))
}
