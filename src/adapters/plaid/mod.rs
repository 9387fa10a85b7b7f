//! Aggregation API object mappings

pub mod serialize;

pub use serialize::{serialize_account, serialize_item, serialize_transaction};
