//! DynamoDB document store
//!
//! This module implements [`DocumentStore`] on top of the AWS DynamoDB SDK.
//!
//! Table layout:
//! - quotes (`id`): the quote documents
//! - quote texts (`text_hash`): one guard item per quote text, written in the
//!   same transaction as the quote so that text uniqueness holds under
//!   concurrent inserts
//! - api keys (`api_key`): issued keys, written with a conditional put
//! - usage (`usage_id`): one counter per (key, method, endpoint), bumped with
//!   a single `ADD` update

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::scan::builders::ScanFluentBuilder;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{
    AttributeValue, Delete, Put, ReturnValue, Select, TransactWriteItem,
};
use aws_sdk_dynamodb::Client as DynamoDbSdkClient;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::db::models::{get_string, ApiKey, ApiUsage, Quote, QuoteFilter};
use crate::db::store::{DocumentStore, StoreError, StoreResult};

type Item = HashMap<String, AttributeValue>;

/// DynamoDB-backed document store.
#[derive(Clone)]
pub struct DynamoDbStore {
    /// Application settings
    settings: Arc<Settings>,

    /// AWS DynamoDB SDK client
    client: DynamoDbSdkClient,
}

/// Attempts at a quote insert transaction before re-reading the text guard
const MAX_INSERT_ATTEMPTS: u32 = 3;

/// How a failed transactional write should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionFailure {
    /// A condition expression rejected one of the writes
    ConditionFailed,
    /// Cancelled because a concurrent transaction held one of the items
    Conflicted,
    /// Any other SDK failure
    Other,
}

impl DynamoDbStore {
    /// Create a new DynamoDB store.
    ///
    /// # Arguments
    /// * `settings` - Application settings containing table names
    /// * `client` - AWS DynamoDB SDK client
    pub fn new(settings: Arc<Settings>, client: DynamoDbSdkClient) -> Self {
        Self { settings, client }
    }

    /// Get a reference to the underlying AWS SDK client
    pub fn client(&self) -> &DynamoDbSdkClient {
        &self.client
    }

    pub fn quotes_table(&self) -> &str {
        &self.settings.dynamodb_quotes_table
    }

    pub fn quote_texts_table(&self) -> &str {
        &self.settings.dynamodb_quote_texts_table
    }

    pub fn api_keys_table(&self) -> &str {
        &self.settings.dynamodb_api_keys_table
    }

    pub fn usage_table(&self) -> &str {
        &self.settings.dynamodb_usage_table
    }

    /// Every table with its string partition key attribute
    pub fn table_keys(&self) -> [(&str, &'static str); 4] {
        [
            (self.quotes_table(), "id"),
            (self.quote_texts_table(), "text_hash"),
            (self.api_keys_table(), "api_key"),
            (self.usage_table(), "usage_id"),
        ]
    }

    /// Run a scan to completion, following pagination
    async fn scan_items(&self, scan: ScanFluentBuilder) -> StoreResult<Vec<Item>> {
        let mut stream = scan.into_paginator().items().send();
        let mut items = Vec::new();

        while let Some(item) = stream.next().await {
            items.push(item.map_err(unavailable)?);
        }

        Ok(items)
    }

    async fn get_quote(&self, id: &str) -> StoreResult<Option<Quote>> {
        let result = self
            .client
            .get_item()
            .table_name(self.quotes_table())
            .key("id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(unavailable)?;

        Ok(result.item.as_ref().and_then(Quote::from_dynamodb))
    }
}

#[async_trait]
impl DocumentStore for DynamoDbStore {
    async fn insert_quote(&self, quote: &Quote) -> StoreResult<()> {
        let quote_put = Put::builder()
            .table_name(self.quotes_table())
            .set_item(Some(quote.to_dynamodb()))
            .condition_expression("attribute_not_exists(id)")
            .build()
            .map_err(unavailable)?;

        let guard_put = Put::builder()
            .table_name(self.quote_texts_table())
            .item("text_hash", AttributeValue::S(text_hash(&quote.text)))
            .item("quote_id", AttributeValue::S(quote.id.clone()))
            .condition_expression("attribute_not_exists(text_hash)")
            .build()
            .map_err(unavailable)?;

        let items = vec![
            TransactWriteItem::builder().put(quote_put).build(),
            TransactWriteItem::builder().put(guard_put).build(),
        ];

        let mut attempt = 1;
        loop {
            let result = self
                .client
                .transact_write_items()
                .set_transact_items(Some(items.clone()))
                .send()
                .await;

            let Err(err) = result else {
                tracing::debug!(quote_id = %quote.id, attempt, "Inserted quote");
                return Ok(());
            };

            match transaction_failure(&err) {
                TransactionFailure::ConditionFailed => return Err(duplicate_text()),
                // A racing insert of the same text is still in flight. Once it
                // settles the guard condition decides.
                TransactionFailure::Conflicted if attempt < MAX_INSERT_ATTEMPTS => {
                    tracing::debug!(
                        quote_id = %quote.id,
                        attempt,
                        "Quote insert conflicted with a concurrent transaction, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(25 * u64::from(attempt))).await;
                    attempt += 1;
                }
                TransactionFailure::Conflicted => {
                    return match self.find_quote_by_text(&quote.text).await? {
                        Some(_) => Err(duplicate_text()),
                        None => Err(unavailable(err)),
                    };
                }
                TransactionFailure::Other => return Err(unavailable(err)),
            }
        }
    }

    async fn find_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>> {
        let mut scan = self.client.scan().table_name(self.quotes_table());

        if let Some(ref author) = filter.author {
            scan = scan
                .filter_expression("#author = :author")
                .expression_attribute_names("#author", "author")
                .expression_attribute_values(":author", AttributeValue::S(author.clone()));
        }

        let items = self.scan_items(scan).await?;
        Ok(items.iter().filter_map(Quote::from_dynamodb).collect())
    }

    async fn find_quote_by_text(&self, text: &str) -> StoreResult<Option<Quote>> {
        let result = self
            .client
            .get_item()
            .table_name(self.quote_texts_table())
            .key("text_hash", AttributeValue::S(text_hash(text)))
            .consistent_read(true)
            .send()
            .await
            .map_err(unavailable)?;

        let Some(quote_id) = result.item.as_ref().and_then(|item| get_string(item, "quote_id"))
        else {
            return Ok(None);
        };

        self.get_quote(&quote_id).await
    }

    async fn count_quotes(&self) -> StoreResult<u64> {
        let mut pages = self
            .client
            .scan()
            .table_name(self.quotes_table())
            .select(Select::Count)
            .into_paginator()
            .send();

        let mut total = 0u64;
        while let Some(page) = pages.next().await {
            let page = page.map_err(unavailable)?;
            total += page.count().max(0) as u64;
        }

        Ok(total)
    }

    async fn quote_at_offset(&self, offset: u64) -> StoreResult<Option<Quote>> {
        let mut stream = self
            .client
            .scan()
            .table_name(self.quotes_table())
            .into_paginator()
            .items()
            .send();

        let mut index = 0u64;
        while let Some(item) = stream.next().await {
            let item = item.map_err(unavailable)?;
            if index == offset {
                return Ok(Quote::from_dynamodb(&item));
            }
            index += 1;
        }

        Ok(None)
    }

    async fn count_distinct_authors(&self) -> StoreResult<u64> {
        let scan = self
            .client
            .scan()
            .table_name(self.quotes_table())
            .projection_expression("#author")
            .expression_attribute_names("#author", "author");

        let items = self.scan_items(scan).await?;
        let authors: HashSet<String> = items
            .iter()
            .filter_map(|item| get_string(item, "author"))
            .collect();

        Ok(authors.len() as u64)
    }

    async fn delete_quote(&self, id: &str) -> StoreResult<bool> {
        let Some(quote) = self.get_quote(id).await? else {
            return Ok(false);
        };

        let quote_delete = Delete::builder()
            .table_name(self.quotes_table())
            .key("id", AttributeValue::S(quote.id.clone()))
            .condition_expression("attribute_exists(id)")
            .build()
            .map_err(unavailable)?;

        let guard_delete = Delete::builder()
            .table_name(self.quote_texts_table())
            .key("text_hash", AttributeValue::S(text_hash(&quote.text)))
            .build()
            .map_err(unavailable)?;

        let result = self
            .client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().delete(quote_delete).build())
            .transact_items(TransactWriteItem::builder().delete(guard_delete).build())
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => match transaction_failure(&err) {
                // Someone else deleted it between our read and our write
                TransactionFailure::ConditionFailed => Ok(false),
                _ => Err(unavailable(err)),
            },
        }
    }

    async fn insert_api_key(&self, api_key: &ApiKey) -> StoreResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(self.api_keys_table())
            .set_item(Some(api_key.to_dynamodb()))
            .condition_expression("attribute_not_exists(api_key)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::Conflict("API key already exists".to_string()))
            }
            Err(err) => Err(unavailable(err)),
        }
    }

    async fn find_api_key(&self, key: &str) -> StoreResult<Option<ApiKey>> {
        let result = self
            .client
            .get_item()
            .table_name(self.api_keys_table())
            .key("api_key", AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(unavailable)?;

        match result.item {
            Some(item) => ApiKey::from_dynamodb(&item)
                .map(Some)
                .ok_or_else(|| StoreError::ParseError("Failed to parse API key".to_string())),
            None => Ok(None),
        }
    }

    async fn list_api_keys(&self) -> StoreResult<Vec<ApiKey>> {
        let scan = self.client.scan().table_name(self.api_keys_table());
        let items = self.scan_items(scan).await?;
        Ok(items.iter().filter_map(ApiKey::from_dynamodb).collect())
    }

    async fn delete_api_key(&self, id: &str) -> StoreResult<bool> {
        let scan = self
            .client
            .scan()
            .table_name(self.api_keys_table())
            .filter_expression("#id = :id")
            .projection_expression("api_key")
            .expression_attribute_names("#id", "id")
            .expression_attribute_values(":id", AttributeValue::S(id.to_string()));

        let items = self.scan_items(scan).await?;
        let mut deleted = false;

        for key in items.iter().filter_map(|item| get_string(item, "api_key")) {
            self.client
                .delete_item()
                .table_name(self.api_keys_table())
                .key("api_key", AttributeValue::S(key))
                .send()
                .await
                .map_err(unavailable)?;
            deleted = true;
        }

        Ok(deleted)
    }

    async fn increment_usage(
        &self,
        key: &str,
        endpoint: &str,
        method: &str,
    ) -> StoreResult<ApiUsage> {
        let result = self
            .client
            .update_item()
            .table_name(self.usage_table())
            .key(
                "usage_id",
                AttributeValue::S(ApiUsage::usage_id(key, endpoint, method)),
            )
            .update_expression(
                "SET #id = if_not_exists(#id, :id), #api_key = :api_key, \
                 #endpoint = :endpoint, #method = :method \
                 ADD #count :one",
            )
            .expression_attribute_names("#id", "id")
            .expression_attribute_names("#api_key", "api_key")
            .expression_attribute_names("#endpoint", "endpoint")
            .expression_attribute_names("#method", "method")
            .expression_attribute_names("#count", "count")
            .expression_attribute_values(":id", AttributeValue::S(uuid::Uuid::new_v4().to_string()))
            .expression_attribute_values(":api_key", AttributeValue::S(key.to_string()))
            .expression_attribute_values(":endpoint", AttributeValue::S(endpoint.to_string()))
            .expression_attribute_values(":method", AttributeValue::S(method.to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(unavailable)?;

        result
            .attributes
            .as_ref()
            .and_then(ApiUsage::from_dynamodb)
            .ok_or_else(|| StoreError::ParseError("Failed to parse usage record".to_string()))
    }

    async fn list_usage(&self) -> StoreResult<Vec<ApiUsage>> {
        let scan = self.client.scan().table_name(self.usage_table());
        let items = self.scan_items(scan).await?;
        Ok(items.iter().filter_map(ApiUsage::from_dynamodb).collect())
    }

    /// Performs a simple list_tables operation to verify connectivity.
    async fn health_check(&self) -> bool {
        match self.client.list_tables().limit(1).send().await {
            Ok(_) => {
                tracing::debug!("DynamoDB health check passed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %DisplayErrorContext(&e), "DynamoDB health check failed");
                false
            }
        }
    }
}

/// Hex-encoded SHA-256 of a quote text, used as the guard item key
pub fn text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn duplicate_text() -> StoreError {
    StoreError::Conflict("quote text already exists".to_string())
}

fn transaction_failure<R>(err: &SdkError<TransactWriteItemsError, R>) -> TransactionFailure {
    match err.as_service_error() {
        Some(TransactWriteItemsError::TransactionCanceledException(cancelled)) => {
            classify_cancellation(cancelled.cancellation_reasons().iter().map(|r| r.code()))
        }
        _ => TransactionFailure::Other,
    }
}

/// Map per-item cancellation reason codes to a failure kind.
///
/// A failed condition anywhere wins over a conflict. Items that were not the
/// cause report `None` (the literal code) or no code at all.
fn classify_cancellation<'a>(
    codes: impl IntoIterator<Item = Option<&'a str>>,
) -> TransactionFailure {
    let mut conflicted = false;

    for code in codes.into_iter().flatten() {
        match code {
            "ConditionalCheckFailed" => return TransactionFailure::ConditionFailed,
            "TransactionConflict" => conflicted = true,
            _ => {}
        }
    }

    if conflicted {
        TransactionFailure::Conflicted
    } else {
        TransactionFailure::Other
    }
}

fn unavailable<E: std::error::Error>(err: E) -> StoreError {
    StoreError::Unavailable(DisplayErrorContext(err).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::error::TransactionCanceledException;
    use aws_sdk_dynamodb::types::CancellationReason;

    #[test]
    fn test_text_hash_is_stable_hex() {
        let hash = text_hash("Stay hungry, stay foolish.");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, text_hash("Stay hungry, stay foolish."));
        assert_ne!(hash, text_hash("Stay hungry, stay foolish"));
    }

    fn cancelled_with(codes: &[&str]) -> SdkError<TransactWriteItemsError, ()> {
        let reasons = codes
            .iter()
            .map(|code| CancellationReason::builder().code(*code).build())
            .collect();
        let cancelled = TransactionCanceledException::builder()
            .set_cancellation_reasons(Some(reasons))
            .build();

        SdkError::service_error(
            TransactWriteItemsError::TransactionCanceledException(cancelled),
            (),
        )
    }

    #[test]
    fn test_condition_failure_maps_to_conflict() {
        assert_eq!(
            classify_cancellation([Some("None"), Some("ConditionalCheckFailed")]),
            TransactionFailure::ConditionFailed
        );
        assert_eq!(
            transaction_failure(&cancelled_with(&["ConditionalCheckFailed", "None"])),
            TransactionFailure::ConditionFailed
        );
    }

    #[test]
    fn test_condition_failure_wins_over_conflict() {
        assert_eq!(
            classify_cancellation([Some("TransactionConflict"), Some("ConditionalCheckFailed")]),
            TransactionFailure::ConditionFailed
        );
    }

    #[test]
    fn test_transaction_conflict_is_retried() {
        assert_eq!(
            classify_cancellation([Some("TransactionConflict"), Some("None")]),
            TransactionFailure::Conflicted
        );
        assert_eq!(
            transaction_failure(&cancelled_with(&["None", "TransactionConflict"])),
            TransactionFailure::Conflicted
        );
    }

    #[test]
    fn test_other_cancellations_are_unavailable() {
        assert_eq!(
            classify_cancellation([Some("ThrottlingError"), None]),
            TransactionFailure::Other
        );
        assert_eq!(
            classify_cancellation(std::iter::empty::<Option<&str>>()),
            TransactionFailure::Other
        );
        assert_eq!(
            transaction_failure(&cancelled_with(&["ValidationError"])),
            TransactionFailure::Other
        );
    }

    #[tokio::test]
    async fn test_table_keys_follow_settings() {
        let settings = Arc::new(Settings {
            dynamodb_quotes_table: "test-quotes".to_string(),
            ..Settings::default()
        });
        let client = crate::config::create_dynamodb_client(&settings).await;
        let store = DynamoDbStore::new(settings, client);

        let keys = store.table_keys();
        assert_eq!(keys[0], ("test-quotes", "id"));
        assert_eq!(keys[1], ("quotes-api-quote-texts", "text_hash"));
        assert_eq!(keys[3].1, "usage_id");
    }
}
