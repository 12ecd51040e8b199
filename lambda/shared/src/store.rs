use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use thiserror::Error;
use tracing::debug;

use crate::book::{Book, BookStatus};
use crate::codec::{self, CodecError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dynamodb {operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
    #[error("stored item could not be decoded: {0}")]
    Codec(#[from] CodecError),
}

/// Single-item reads and writes plus the per-owner query. Every call is
/// one round trip; nothing is retried and there is no concurrency control,
/// so the last `put` wins.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn put(&self, owner: &str, book: &Book) -> Result<(), StoreError>;

    async fn get(&self, owner: &str, book_id: &str) -> Result<Option<Book>, StoreError>;

    /// Unconditional; callers that need a 404 check with [`BookStore::get`] first.
    async fn delete(&self, owner: &str, book_id: &str) -> Result<(), StoreError>;

    /// Everything in the owner's partition, optionally filtered by status.
    /// One unpaginated request, in whatever order the table returns.
    async fn query_by_owner(
        &self,
        owner: &str,
        status: Option<BookStatus>,
    ) -> Result<Vec<Book>, StoreError>;
}

pub struct DynamoBookStore {
    client: Client,
    table: String,
}

impl DynamoBookStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

fn backend<E: std::error::Error>(operation: &'static str, err: E) -> StoreError {
    StoreError::Backend {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl BookStore for DynamoBookStore {
    async fn put(&self, owner: &str, book: &Book) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(codec::encode(owner, book)))
            .send()
            .await
            .map_err(|err| backend("put_item", err))?;
        Ok(())
    }

    async fn get(&self, owner: &str, book_id: &str) -> Result<Option<Book>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(codec::key(owner, book_id)))
            .send()
            .await
            .map_err(|err| backend("get_item", err))?;

        match output.item() {
            Some(item) => Ok(Some(codec::decode(item)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, owner: &str, book_id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .set_key(Some(codec::key(owner, book_id)))
            .send()
            .await
            .map_err(|err| backend("delete_item", err))?;
        Ok(())
    }

    async fn query_by_owner(
        &self,
        owner: &str,
        status: Option<BookStatus>,
    ) -> Result<Vec<Book>, StoreError> {
        let mut query = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("#pk = :pk")
            .expression_attribute_names("#pk", codec::PARTITION_KEY)
            .expression_attribute_values(":pk", AttributeValue::S(codec::partition_key(owner)));

        // `status` is a DynamoDB reserved word.
        if let Some(status) = status {
            query = query
                .filter_expression("#status = :status")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(
                    ":status",
                    AttributeValue::S(status.as_str().to_string()),
                );
        }

        let output = query.send().await.map_err(|err| backend("query", err))?;
        let items = output.items.unwrap_or_default();
        debug!(owner, count = items.len(), "queried owner partition");

        items
            .iter()
            .map(|item| codec::decode(item).map_err(StoreError::from))
            .collect()
    }
}
