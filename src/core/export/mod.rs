//! Download and export cycles over the storage contract

pub mod coordinator;
pub mod summary;

pub use coordinator::{ExportCoordinator, LedgerRenderer};
pub use summary::ExportSummary;
