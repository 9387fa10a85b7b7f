//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, LedgerSyncConfig};
use super::secret::secret_string;
use crate::domain::errors::{Result, SyncError};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "LEDGERSYNC_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Loads a `.env` file from the working directory, if present
/// 2. Reads the TOML file
/// 3. Substitutes `${VAR}` placeholders from the environment
/// 4. Parses the TOML into [`LedgerSyncConfig`]
/// 5. Applies `LEDGERSYNC_*` environment overrides
/// 6. Validates the result
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] if the file is missing or unreadable,
/// a placeholder names an unset variable, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use ledgersync::config::load_config;
///
/// let config = load_config("ledgersync.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LedgerSyncConfig> {
    let path = path.as_ref();

    if let Ok(env_file) = dotenvy::dotenv() {
        tracing::debug!(path = %env_file.display(), "Loaded environment file");
    }

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text; see [`load_config`] for the steps applied
pub fn parse_config(contents: &str) -> Result<LedgerSyncConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: LedgerSyncConfig = toml::from_str(&contents)?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SyncError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left as they are.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SyncError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        SyncError::Configuration(format!("Invalid value '{value}' for {ENV_PREFIX}{key}"))
    })
}

/// Applies environment variable overrides using the `LEDGERSYNC_` prefix
///
/// Variables follow the pattern `LEDGERSYNC_<SECTION>_<KEY>`, for example
/// `LEDGERSYNC_SQLITE_PATH` or `LEDGERSYNC_COSMOSDB_KEY`.
fn apply_env_overrides(config: &mut LedgerSyncConfig) -> Result<()> {
    if let Some(val) = env_var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_var("DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "cosmosdb" => DatabaseTarget::CosmosDB,
            "sqlite" => DatabaseTarget::SQLite,
            _ => {
                return Err(SyncError::Configuration(format!(
                    "Invalid value '{val}' for {ENV_PREFIX}DATABASE_TARGET"
                )))
            }
        };
    }

    if let Some(cosmos_config) = config.cosmosdb.as_mut() {
        if let Some(val) = env_var("COSMOSDB_ENDPOINT") {
            cosmos_config.endpoint = val;
        }
        if let Some(val) = env_var("COSMOSDB_KEY") {
            cosmos_config.key = secret_string(val);
        }
        if let Some(val) = env_var("COSMOSDB_DATABASE_NAME") {
            cosmos_config.database_name = val;
        }
        if let Some(val) = env_var("COSMOSDB_CONTAINER") {
            cosmos_config.container = val;
        }
        if let Some(val) = env_var("COSMOSDB_ACCOUNT_ID") {
            cosmos_config.account_id = val;
        }
    }

    if let Some(sqlite_config) = config.sqlite.as_mut() {
        if let Some(val) = env_var("SQLITE_PATH") {
            sqlite_config.path = val;
        }
        if let Some(val) = env_var("SQLITE_ACCOUNT_ID") {
            sqlite_config.account_id = Some(val);
        }
        if let Some(val) = env_var("SQLITE_BUSY_TIMEOUT_MS") {
            sqlite_config.busy_timeout_ms = parse_env("SQLITE_BUSY_TIMEOUT_MS", &val)?;
        }
    }

    if let Some(val) = env_var("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("LEDGERSYNC_TEST_SUBST_KEY", "value-1");
        let result = substitute_env_vars("key = \"${LEDGERSYNC_TEST_SUBST_KEY}\"").unwrap();
        assert_eq!(result, "key = \"value-1\"\n");
        std::env::remove_var("LEDGERSYNC_TEST_SUBST_KEY");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("LEDGERSYNC_TEST_MISSING");
        let err = substitute_env_vars("key = \"${LEDGERSYNC_TEST_MISSING}\"").unwrap_err();
        assert!(err.to_string().contains("LEDGERSYNC_TEST_MISSING"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("LEDGERSYNC_TEST_COMMENTED");
        let input = "# key = \"${LEDGERSYNC_TEST_COMMENTED}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent-ledgersync.toml").is_err());
    }

    #[test]
    fn test_parse_config_sqlite() {
        let config = parse_config(
            r#"
database_target = "sqlite"

[sqlite]
path = "ledger.db"
"#,
        )
        .unwrap();

        let sqlite = config.sqlite.unwrap();
        assert_eq!(sqlite.path, "ledger.db");
        assert_eq!(sqlite.busy_timeout_ms, 5000);
        assert_eq!(config.application.log_level, "info");
    }

    #[test]
    fn test_parse_config_rejects_unknown_target() {
        assert!(parse_config("database_target = \"mongodb\"").is_err());
    }
}
