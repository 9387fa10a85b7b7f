//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output filtered by the configured level
//! - JSON-formatted log files with rotation
//!
//! # Example
//!
//! ```no_run
//! use ledgersync::logging::init_logging;
//! use ledgersync::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Sync started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the outcome of a save batch
///
/// # Example
///
/// ```no_run
/// use ledgersync::log_batch_saved;
/// use ledgersync::adapters::storage::SaveSummary;
///
/// let summary = SaveSummary::default();
/// log_batch_saved!("sqlite", &summary);
/// ```
#[macro_export]
macro_rules! log_batch_saved {
    ($backend:expr, $summary:expr) => {
        tracing::info!(
            backend = $backend,
            saved = $summary.saved,
            inserted = $summary.inserted,
            updated = $summary.updated,
            skipped_pending = $summary.skipped_pending,
            skipped_foreign = $summary.skipped_foreign,
            malformed = $summary.malformed.len(),
            "Saved transaction batch"
        );
    };
}

/// Log the outcome of a metadata update batch
#[macro_export]
macro_rules! log_metadata_updated {
    ($backend:expr, $summary:expr, $mark_pulled:expr) => {
        tracing::info!(
            backend = $backend,
            updated = $summary.updated,
            missing = $summary.missing,
            ambiguous = $summary.ambiguous.len(),
            malformed = $summary.malformed.len(),
            mark_pulled = ?$mark_pulled,
            "Updated transaction metadata"
        );
    };
}

/// Log the completion of an export cycle
///
/// # Example
///
/// ```no_run
/// use ledgersync::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!(42, Duration::from_millis(350));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($count:expr, $duration:expr) => {
        tracing::info!(
            count = $count,
            duration_ms = $duration.as_millis(),
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use ledgersync::log_error_with_context;
/// use ledgersync::domain::SyncError;
///
/// let error = SyncError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::adapters::storage::{SaveSummary, UpdateSummary};
    use crate::domain::SyncError;
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let saved = SaveSummary::default();
        let updated = UpdateSummary::default();
        log_batch_saved!("memory", &saved);
        log_metadata_updated!("memory", &updated, Some(true));
        log_export_complete!(0usize, Duration::from_millis(1));
        log_error_with_context!(&SyncError::Io("disk".to_string()), "test");
    }
}
