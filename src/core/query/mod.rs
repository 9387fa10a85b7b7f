//! Transaction queries
//!
//! Backend-independent description of which stored transactions a caller wants.

pub mod filter;

pub use filter::{DateRange, Predicate, TransactionFilter};
