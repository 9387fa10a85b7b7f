//! Configuration schema types
//!
//! This module defines the configuration structure for ledgersync.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseTarget {
    /// Azure Cosmos DB document store
    CosmosDB,
    /// SQLite relational store
    #[default]
    SQLite,
}

/// Main ledgersync configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerSyncConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Storage backend (cosmosdb or sqlite)
    #[serde(default)]
    pub database_target: DatabaseTarget,

    /// Azure Cosmos DB configuration (required if database_target = cosmosdb)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmosdb: Option<CosmosDbConfig>,

    /// SQLite configuration (required if database_target = sqlite)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<SqliteConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LedgerSyncConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;

        match self.database_target {
            DatabaseTarget::CosmosDB => match &self.cosmosdb {
                Some(cosmos) => cosmos.validate()?,
                None => {
                    return Err(
                        "cosmosdb configuration is required when database_target = 'cosmosdb'"
                            .to_string(),
                    )
                }
            },
            DatabaseTarget::SQLite => match &self.sqlite {
                Some(sqlite) => sqlite.validate()?,
                None => {
                    return Err(
                        "sqlite configuration is required when database_target = 'sqlite'"
                            .to_string(),
                    )
                }
            },
        }

        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Azure Cosmos DB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmosDbConfig {
    /// Cosmos DB endpoint URL
    pub endpoint: String,

    /// Cosmos DB access key, zeroized on drop
    pub key: SecretString,

    /// Database name
    pub database_name: String,

    /// Transactions container name
    #[serde(default = "default_container")]
    pub container: String,

    /// Account whose transactions this instance stores
    pub account_id: String,
}

impl CosmosDbConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        let endpoint = url::Url::parse(&self.endpoint)
            .map_err(|e| format!("cosmosdb.endpoint is not a valid URL: {e}"))?;
        if endpoint.scheme() != "https" {
            return Err("cosmosdb.endpoint must start with https://".to_string());
        }

        if self.key.expose_secret().is_empty() {
            return Err("cosmosdb.key cannot be empty".to_string());
        }

        if self.database_name.trim().is_empty() {
            return Err("cosmosdb.database_name cannot be empty".to_string());
        }

        if self.container.trim().is_empty() {
            return Err("cosmosdb.container cannot be empty".to_string());
        }

        if self.account_id.trim().is_empty() {
            return Err("cosmosdb.account_id cannot be empty".to_string());
        }

        Ok(())
    }
}

/// SQLite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file path, or `:memory:`
    pub path: String,

    /// Restrict reads and id-only updates to one account
    #[serde(default)]
    pub account_id: Option<String>,

    /// How long a locked database is retried before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl SqliteConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("sqlite.path cannot be empty".to_string());
        }

        if matches!(&self.account_id, Some(id) if id.trim().is_empty()) {
            return Err("sqlite.account_id cannot be blank when set".to_string());
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to local files
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_container() -> String {
    "transactions".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
