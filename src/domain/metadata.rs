//! Export metadata sidecar
//!
//! The `plaid2text` sidecar is owned by ledgersync, not by the upstream source.
//! It is written once with defaults when a transaction is first stored and
//! afterwards only changed through explicit metadata patches.

use crate::domain::ids::{AccountId, TransactionId};
use crate::domain::timestamp::{format_timestamp, optional_timestamp};
use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Name of the metadata sub-document / field
pub const METADATA_FIELD: &str = "plaid2text";

/// Export-tracking metadata attached to a stored transaction
///
/// Every field tolerates absence when decoding: metadata assembled from merge
/// patches may only carry a subset of the keys. Keys this struct doesn't know
/// are kept in `extra` so a round trip never drops them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportMetadata {
    /// Ledger tags
    pub tags: BTreeSet<String>,

    /// Payee written to the ledger entry
    pub payee: String,

    /// Ledger account the transaction posts to
    pub posting_account: String,

    /// Counter-account of the posting
    pub associated_account: String,

    /// When the transaction was first stored
    #[serde(with = "optional_timestamp")]
    pub date_downloaded: Option<DateTime<Utc>>,

    /// When the transaction was last written to a ledger file
    #[serde(with = "optional_timestamp")]
    pub date_last_pulled: Option<DateTime<Utc>>,

    /// Whether the transaction has been written to a ledger file
    pub pulled_to_file: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExportMetadata {
    /// Default sidecar applied on first insert
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            date_downloaded: Some(now),
            ..Self::default()
        }
    }

    /// Decodes a stored metadata value
    ///
    /// `null` and `{}` both mean "never touched" and decode as `None`.
    pub fn from_stored(value: Value) -> std::result::Result<Option<Self>, serde_json::Error> {
        match value {
            Value::Null => Ok(None),
            Value::Object(ref map) if map.is_empty() => Ok(None),
            other => serde_json::from_value(other).map(Some),
        }
    }

    /// Encodes this metadata as a JSON object
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Shallow metadata update for one transaction
///
/// Only the keys set on the patch are touched; everything else in the stored
/// sidecar is preserved.
///
/// # Examples
///
/// ```
/// use ledgersync::domain::MetadataPatch;
///
/// let patch = MetadataPatch::new("T1")
///     .unwrap()
///     .payee("Corner Cafe")
///     .posting_account("Expenses:Food:Restaurants")
///     .tag("coffee");
/// assert_eq!(patch.transaction_id().as_str(), "T1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataPatch {
    transaction_id: TransactionId,
    account_id: Option<AccountId>,
    fields: Map<String, Value>,
}

impl MetadataPatch {
    /// Creates an empty patch for a transaction ID
    pub fn new(transaction_id: impl Into<String>) -> std::result::Result<Self, String> {
        Ok(Self::for_transaction(TransactionId::new(transaction_id)?))
    }

    /// Creates an empty patch from an already validated ID
    pub fn for_transaction(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            account_id: None,
            fields: Map::new(),
        }
    }

    /// Restricts the update to the transaction in this account
    pub fn in_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn payee(self, payee: impl Into<String>) -> Self {
        self.set("payee", Value::String(payee.into()))
    }

    pub fn posting_account(self, account: impl Into<String>) -> Self {
        self.set("posting_account", Value::String(account.into()))
    }

    pub fn associated_account(self, account: impl Into<String>) -> Self {
        self.set("associated_account", Value::String(account.into()))
    }

    /// Replaces the tag set
    pub fn tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        self.set(
            "tags",
            Value::Array(tags.into_iter().map(Value::String).collect()),
        )
    }

    /// Adds one tag to the tags this patch sets
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let mut tags: BTreeSet<String> = match self.fields.get("tags") {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => BTreeSet::new(),
        };
        tags.insert(tag.into());
        self.fields.insert(
            "tags".to_string(),
            Value::Array(tags.into_iter().map(Value::String).collect()),
        );
        self
    }

    /// Sets an arbitrary metadata key; `Value::Null` removes the key on merge
    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Builds the merge document applied to the stored sidecar
    ///
    /// With `mark_pulled` set, `pulled_to_file` takes its value, and marking
    /// as pulled also stamps `date_last_pulled` with `now`.
    pub fn to_merge_document(&self, mark_pulled: Option<bool>, now: DateTime<Utc>) -> Value {
        let mut document = self.fields.clone();
        if let Some(pulled) = mark_pulled {
            document.insert("pulled_to_file".to_string(), Value::Bool(pulled));
            if pulled {
                document.insert(
                    "date_last_pulled".to_string(),
                    Value::String(format_timestamp(&now)),
                );
            }
        }
        Value::Object(document)
    }
}
