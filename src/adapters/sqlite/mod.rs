//! SQLite relational backend
//!
//! A single `transactions` table with a unique `(account_id, transaction_id)`
//! index and two JSON text columns.

pub mod client;
pub mod storage;

pub use client::SqliteClient;
pub use storage::SqliteStorage;
