//! Transactions container as a [`DocumentCollection`]

use super::query::{count_documents, latest_date, select_documents, RenderedQuery};
use crate::adapters::document::{DocumentCollection, WriteOutcome};
use crate::core::query::TransactionFilter;
use crate::domain::ids::{AccountId, TransactionKey};
use crate::domain::{CosmosDbError, Result};
use async_trait::async_trait;
use azure_core::http::{Etag, StatusCode};
use azure_data_cosmos::clients::ContainerClient;
use azure_data_cosmos::{ItemOptions, PartitionKey};
use futures::stream::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Cosmos DB container holding transaction documents
pub struct CosmosCollection {
    container: ContainerClient,
    name: String,
}

impl CosmosCollection {
    pub fn new(container: ContainerClient, name: impl Into<String>) -> Self {
        Self {
            container,
            name: name.into(),
        }
    }

    /// Runs a single-partition query and collects every item
    async fn collect<T>(&self, filter: &TransactionFilter, rendered: RenderedQuery) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let Some(account_id) = &filter.account_id else {
            return Err(CosmosDbError::QueryFailed(
                "Cross-partition queries are not supported; scope the filter to an account"
                    .to_string(),
            )
            .into());
        };
        let partition_key = PartitionKey::from(account_id.to_string());

        tracing::debug!(container = %self.name, query = %rendered.sql, "Querying transactions");

        let mut pager = self
            .container
            .query_items::<T>(rendered.into_query()?, partition_key, None)
            .map_err(|e| CosmosDbError::QueryFailed(format!("Failed to create query: {e}")))?;

        let mut items = Vec::new();
        while let Some(item) = pager.next().await {
            let item = item
                .map_err(|e| CosmosDbError::QueryFailed(format!("Failed to read query page: {e}")))?;
            items.push(item);
        }
        Ok(items)
    }
}

fn is_not_found(error: &impl std::fmt::Display) -> bool {
    let message = error.to_string();
    message.contains("404") || message.contains("NotFound")
}

/// Statuses a conditional write answers when another writer got there first
fn is_write_conflict(status: Option<StatusCode>) -> bool {
    matches!(
        status,
        Some(StatusCode::Conflict | StatusCode::PreconditionFailed | StatusCode::NotFound)
    )
}

fn write_outcome(
    result: azure_core::Result<impl Sized>,
    key: &TransactionKey,
    action: &str,
) -> Result<WriteOutcome> {
    match result {
        Ok(_) => Ok(WriteOutcome::Written),
        Err(e) if is_write_conflict(e.http_status()) => {
            tracing::debug!(%key, action, "Conditional write lost to another writer");
            Ok(WriteOutcome::Conflict)
        }
        Err(e) => Err(CosmosDbError::WriteFailed(format!("Failed to {action} {key}: {e}")).into()),
    }
}

#[async_trait]
impl DocumentCollection for CosmosCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &TransactionKey) -> Result<Option<Value>> {
        let partition_key = PartitionKey::from(key.account_id.to_string());

        match self
            .container
            .read_item::<Value>(partition_key, key.transaction_id.as_str(), None)
            .await
        {
            Ok(response) => {
                let document = response.into_body().map_err(|e| {
                    CosmosDbError::ReadFailed(format!("Failed to decode document {key}: {e}"))
                })?;
                Ok(Some(document))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(CosmosDbError::ReadFailed(format!("Failed to read {key}: {e}")).into()),
        }
    }

    async fn create(&self, key: &TransactionKey, document: Value) -> Result<WriteOutcome> {
        let partition_key = PartitionKey::from(key.account_id.to_string());
        let result = self.container.create_item(partition_key, document, None).await;
        write_outcome(result, key, "create")
    }

    async fn replace(
        &self,
        key: &TransactionKey,
        document: Value,
        etag: Option<&str>,
    ) -> Result<WriteOutcome> {
        let partition_key = PartitionKey::from(key.account_id.to_string());
        let options = ItemOptions {
            if_match_etag: etag.map(Etag::from),
            ..Default::default()
        };

        let result = self
            .container
            .replace_item(partition_key, key.transaction_id.as_str(), document, Some(options))
            .await;
        write_outcome(result, key, "replace")
    }

    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Value>> {
        self.collect(filter, select_documents(filter)).await
    }

    async fn count(&self, filter: &TransactionFilter) -> Result<u64> {
        let counts: Vec<u64> = self.collect(filter, count_documents(filter)).await?;
        Ok(counts.into_iter().sum())
    }

    async fn latest_date(&self, account_id: &AccountId) -> Result<Option<String>> {
        let filter = TransactionFilter::default().scoped_to(Some(account_id));
        let dates: Vec<String> = self.collect(&filter, latest_date(&filter)).await?;
        Ok(dates.into_iter().next())
    }
}
