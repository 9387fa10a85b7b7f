//! Integration tests for logging functionality

use ledgersync::config::LoggingConfig;
use ledgersync::logging::init_logging;
use tempfile::TempDir;

fn file_config(path: &std::path::Path, rotation: &str) -> LoggingConfig {
    LoggingConfig {
        local_enabled: true,
        local_path: path.to_string_lossy().to_string(),
        local_rotation: rotation.to_string(),
    }
}

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_level_rejected_before_init() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let result = init_logging("verbose", &file_config(&log_path, "daily"));
    assert!(result.is_err());
    assert!(!log_path.exists());
}

#[test]
fn test_invalid_rotation_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let err = init_logging("info", &file_config(&log_path, "weekly"))
        .err()
        .unwrap();
    assert!(err.to_string().contains("weekly"));
}

// The global subscriber can only be installed once per test binary
#[test]
fn test_init_creates_log_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("nested").join("logs");
    assert!(!log_path.exists());

    let guard = init_logging("debug", &file_config(&log_path, "never")).unwrap();
    tracing::info!(component = "integration-test", "Log line");
    drop(guard);

    assert!(log_path.is_dir());
}
