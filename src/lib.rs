// Ledgersync - Bank transaction store for plain-text ledger exports
// Copyright (c) 2025 Ledgersync Contributors
// Licensed under the MIT License

//! # Ledgersync
//!
//! Ledgersync stores bank transactions downloaded from an aggregation API and
//! tracks which of them have already been written to a plain-text ledger, so
//! that repeated download and export runs write every settled transaction
//! exactly once.
//!
//! ## Architecture
//!
//! - [`domain`] - Transaction records, export metadata, identifiers and errors
//! - [`core`] - Typed query filters, JSON merge patch, export cycles
//! - [`adapters`] - Storage contract and its backends (Cosmos DB, SQLite,
//!   in-memory), upstream object mappings
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Storage Contract
//!
//! Every backend implements [`adapters::storage::TransactionStorage`]:
//!
//! - `save_transactions` upserts settled transactions by `(account_id,
//!   transaction_id)` and skips pending ones. Re-saving refreshes the core
//!   fields and never resets export metadata.
//! - `get_transactions(from, to, only_new)` returns records ordered by date.
//! - `update_transaction(patches, mark_pulled)` merges metadata patches.
//! - `check_pending` reports whether anything is left to export.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ledgersync::adapters::storage::create_storage;
//! use ledgersync::config::load_config;
//! use ledgersync::core::export::ExportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ledgersync.toml")?;
//!     let _guard = ledgersync::logging::init_logging(
//!         &config.application.log_level,
//!         &config.logging,
//!     )?;
//!
//!     let storage = create_storage(&config).await?;
//!     let coordinator = ExportCoordinator::new(storage);
//!     println!("Unexported transactions: {}", coordinator.has_unexported().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error type is
//! [`domain::SyncError`]. Backend gaps are reported as
//! [`domain::SyncError::UnsupportedOperation`] instead of a default answer.

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
