//! Domain identifier types with validation
//!
//! Newtype wrappers for the upstream identifiers. Deserialization runs the same
//! validation as the constructors, so an empty key never reaches a backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account identifier newtype wrapper
///
/// Identifies the upstream bank account a transaction belongs to.
///
/// # Examples
///
/// ```
/// use ledgersync::domain::ids::AccountId;
/// use std::str::FromStr;
///
/// let account_id = AccountId::from_str("BxBXxLj1m4HMXBm9WZZmCWVbPjX16EHwv99vp").unwrap();
/// assert_eq!(account_id.as_str(), "BxBXxLj1m4HMXBm9WZZmCWVbPjX16EHwv99vp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Creates a new AccountId from a string
    ///
    /// Returns `Err` if the ID is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Account ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the account ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Transaction identifier newtype wrapper
///
/// Upstream transaction IDs are unique per account; combined with the account
/// they form the natural key ([`TransactionKey`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Creates a new TransactionId from a string
    ///
    /// Returns `Err` if the ID is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Transaction ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the transaction ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

macro_rules! impl_id_traits {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_id_traits!(AccountId);
impl_id_traits!(TransactionId);

/// Natural key of a stored transaction: `(account_id, transaction_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionKey {
    /// Owning account
    pub account_id: AccountId,

    /// Transaction ID within the account
    pub transaction_id: TransactionId,
}

impl TransactionKey {
    /// Creates a new natural key
    pub fn new(account_id: AccountId, transaction_id: TransactionId) -> Self {
        Self {
            account_id,
            transaction_id,
        }
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_id, self.transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_valid() {
        let id = AccountId::new("acc-1").unwrap();
        assert_eq!(id.as_str(), "acc-1");
        assert_eq!(id.to_string(), "acc-1");
    }

    #[test]
    fn test_ids_reject_empty() {
        assert!(AccountId::new("").is_err());
        assert!(AccountId::new("   ").is_err());
        assert!(TransactionId::new("").is_err());
    }

    #[test]
    fn test_transaction_id_serde_is_transparent() {
        let id = TransactionId::new("T1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"T1\"");

        let parsed: TransactionId = serde_json::from_str("\"T1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_deserialize_rejects_empty_id() {
        let result = serde_json::from_str::<TransactionId>("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_transaction_key_display() {
        let key = TransactionKey::new(
            AccountId::new("A1").unwrap(),
            TransactionId::new("T1").unwrap(),
        );
        assert_eq!(key.to_string(), "A1/T1");
    }
}
