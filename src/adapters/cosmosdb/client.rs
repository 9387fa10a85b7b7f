//! Cosmos DB client implementation
//!
//! Connects with key authentication and provisions the transactions
//! container, partitioned by account.

use crate::config::CosmosDbConfig;
use crate::domain::{CosmosDbError, Result};
use azure_core::credentials::Secret;
use azure_data_cosmos::clients::{ContainerClient, DatabaseClient};
use azure_data_cosmos::models::{
    ContainerProperties, IndexingPolicy, PartitionKeyDefinition, PartitionKeyKind,
};
use azure_data_cosmos::{CosmosClient, CosmosClientOptions};
use std::borrow::Cow;

/// Partition key path of the transactions container
pub const PARTITION_KEY_PATH: &str = "/account_id";

/// Cosmos DB client for ledgersync
pub struct CosmosDbClient {
    client: CosmosClient,
    database: DatabaseClient,
    config: CosmosDbConfig,
}

impl CosmosDbClient {
    /// Create a new Cosmos DB client
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(config: CosmosDbConfig) -> Result<Self> {
        use secrecy::ExposeSecret;

        let key_str: String = config.key.expose_secret().clone().into();
        let key = Secret::new(key_str);
        let options = Some(CosmosClientOptions::default());

        let client = CosmosClient::with_key(&config.endpoint, key, options).map_err(|e| {
            CosmosDbError::ConnectionFailed(format!("Failed to create Cosmos client: {e}"))
        })?;

        let database = client.database_client(&config.database_name);

        Ok(Self {
            client,
            database,
            config,
        })
    }

    /// Test the connection to Cosmos DB by reading the database
    pub async fn test_connection(&self) -> Result<()> {
        self.database.read(None).await.map_err(|e| {
            CosmosDbError::ConnectionFailed(format!("Connection test failed: {e}"))
        })?;
        Ok(())
    }

    /// Ensure the database exists, creating it if necessary
    pub async fn ensure_database_exists(&self) -> Result<()> {
        match self.database.read(None).await {
            Ok(_) => {
                tracing::debug!(database = %self.config.database_name, "Database already exists");
                Ok(())
            }
            Err(_) => {
                tracing::info!(database = %self.config.database_name, "Creating database");

                self.client
                    .create_database(&self.config.database_name, None)
                    .await
                    .map_err(|e| {
                        CosmosDbError::DatabaseCreationFailed(format!(
                            "Failed to create database: {e}"
                        ))
                    })?;

                Ok(())
            }
        }
    }

    /// Ensure the transactions container exists, creating it if necessary
    ///
    /// Partition key: `/account_id`
    pub async fn ensure_container_exists(&self) -> Result<()> {
        let container_name = &self.config.container;
        let container = self.database.container_client(container_name);

        match container.read(None).await {
            Ok(_) => {
                tracing::debug!(container = %container_name, "Container already exists");
                Ok(())
            }
            Err(_) => {
                tracing::info!(container = %container_name, "Creating container");

                let properties = ContainerProperties {
                    id: Cow::Owned(container_name.clone()),
                    partition_key: PartitionKeyDefinition {
                        paths: vec![PARTITION_KEY_PATH.to_string()],
                        kind: PartitionKeyKind::Hash,
                        version: None,
                    },
                    indexing_policy: Some(IndexingPolicy::default()),
                    ..Default::default()
                };

                self.database
                    .create_container(properties, None)
                    .await
                    .map_err(|e| {
                        CosmosDbError::ContainerCreationFailed(format!(
                            "Failed to create container {container_name}: {e}"
                        ))
                    })?;

                Ok(())
            }
        }
    }

    /// Client for the transactions container
    pub fn container_client(&self) -> ContainerClient {
        self.database.container_client(&self.config.container)
    }

    pub fn container_name(&self) -> &str {
        &self.config.container
    }

    pub fn database_name(&self) -> &str {
        &self.config.database_name
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret::SecretValue;
    use secrecy::Secret;

    #[test]
    fn test_client_keeps_names() {
        let config = CosmosDbConfig {
            endpoint: "https://test.documents.azure.com:443/".to_string(),
            key: Secret::new(SecretValue::from("dGVzdC1rZXk=".to_string())),
            database_name: "finance".to_string(),
            container: "transactions".to_string(),
            account_id: "A1".to_string(),
        };

        let client = CosmosDbClient::new(config).unwrap();
        assert_eq!(client.container_name(), "transactions");
        assert_eq!(client.database_name(), "finance");
        assert_eq!(client.endpoint(), "https://test.documents.azure.com:443/");
    }
}
