//! Transaction storage abstraction
//!
//! [`TransactionStorage`] is the one contract both backends implement; use
//! [`create_storage`] to build the configured one.

pub mod factory;
pub mod traits;

pub use factory::create_storage;
pub use traits::{FetchResult, MalformedRecord, SaveSummary, TransactionStorage, UpdateSummary};
