//! Configuration management for ledgersync.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `LEDGERSYNC_*`
//! environment overrides, defaults for optional settings and validation on
//! load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ledgersync::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ledgersync.toml")?;
//! if let Some(sqlite) = &config.sqlite {
//!     println!("SQLite database: {}", sqlite.path);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`DatabaseTarget`] - Which backend to build
//! - [`CosmosDbConfig`] - Cosmos DB connection, container and account
//! - [`SqliteConfig`] - SQLite file and optional account scope
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! database_target = "cosmosdb"
//!
//! [application]
//! log_level = "info"
//!
//! [cosmosdb]
//! endpoint = "https://your-account.documents.azure.com:443/"
//! key = "${LEDGERSYNC_COSMOS_KEY}"
//! database_name = "finance"
//! container = "transactions"
//! account_id = "BxBXxLj1m4HMXBm9WZZmCWVbPjX16EHwv99vp"
//!
//! [logging]
//! local_enabled = true
//! local_path = "./logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, CosmosDbConfig, DatabaseTarget, LedgerSyncConfig, LoggingConfig,
    SqliteConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
