//! Storage backend factory
//!
//! Builds the backend named by `database_target` from its configuration
//! section.

use crate::adapters::cosmosdb::{CosmosCollection, CosmosDbClient};
use crate::adapters::document::DocumentStorage;
use crate::adapters::sqlite::{SqliteClient, SqliteStorage};
use crate::adapters::storage::traits::TransactionStorage;
use crate::config::schema::{DatabaseTarget, LedgerSyncConfig};
use crate::domain::ids::AccountId;
use crate::domain::{Result, SyncError};
use std::sync::Arc;

/// Create a transaction storage based on the configuration
///
/// The Cosmos DB database and container are created when missing.
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] when the target's section is missing
/// or names an invalid account, and [`SyncError::Connection`] (or a Cosmos DB
/// error) when the backend can't be reached.
pub async fn create_storage(config: &LedgerSyncConfig) -> Result<Arc<dyn TransactionStorage>> {
    match config.database_target {
        DatabaseTarget::CosmosDB => {
            let cosmos_config = config.cosmosdb.as_ref().ok_or_else(|| {
                SyncError::Configuration("[cosmosdb] section is required".to_string())
            })?;
            let account_id = parse_account(&cosmos_config.account_id)?;

            tracing::info!(
                endpoint = %cosmos_config.endpoint,
                database = %cosmos_config.database_name,
                container = %cosmos_config.container,
                "Creating Cosmos DB transaction storage"
            );
            let client = CosmosDbClient::new(cosmos_config.clone())?;
            client.ensure_database_exists().await?;
            client.ensure_container_exists().await?;

            let collection = CosmosCollection::new(client.container_client(), client.container_name());
            Ok(Arc::new(DocumentStorage::new(collection, account_id)) as Arc<dyn TransactionStorage>)
        }
        DatabaseTarget::SQLite => {
            let sqlite_config = config.sqlite.as_ref().ok_or_else(|| {
                SyncError::Configuration("[sqlite] section is required".to_string())
            })?;
            let account_id = sqlite_config
                .account_id
                .as_deref()
                .map(parse_account)
                .transpose()?;

            tracing::info!(path = %sqlite_config.path, "Creating SQLite transaction storage");
            let client = SqliteClient::open(sqlite_config)?;
            Ok(Arc::new(SqliteStorage::new(client, account_id)) as Arc<dyn TransactionStorage>)
        }
    }
}

fn parse_account(account_id: &str) -> Result<AccountId> {
    AccountId::new(account_id)
        .map_err(|e| SyncError::Configuration(format!("Invalid account_id: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SqliteConfig;

    fn sqlite_target(sqlite: Option<SqliteConfig>) -> LedgerSyncConfig {
        LedgerSyncConfig {
            database_target: DatabaseTarget::SQLite,
            sqlite,
            ..LedgerSyncConfig::default()
        }
    }

    #[tokio::test]
    async fn test_create_sqlite_storage() {
        let config = sqlite_target(Some(SqliteConfig {
            path: ":memory:".to_string(),
            account_id: Some("A1".to_string()),
            busy_timeout_ms: 500,
        }));

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn test_missing_section_is_configuration_error() {
        let result = create_storage(&sqlite_target(None)).await;
        assert!(matches!(result, Err(SyncError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_blank_account_is_configuration_error() {
        let config = sqlite_target(Some(SqliteConfig {
            path: ":memory:".to_string(),
            account_id: Some("  ".to_string()),
            busy_timeout_ms: 500,
        }));
        assert!(matches!(
            create_storage(&config).await,
            Err(SyncError::Configuration(_))
        ));
    }
}
