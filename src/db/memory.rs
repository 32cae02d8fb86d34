//! In-memory document store
//!
//! Keeps all three collections in process memory. Used for local development
//! (`STORE_BACKEND=memory`) and as the backend for tests. Uniqueness checks
//! and counter increments happen under a single write lock, which gives the
//! same guarantees the DynamoDB backend gets from conditional writes.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::db::models::{ApiKey, ApiUsage, Quote, QuoteFilter};
use crate::db::store::{DocumentStore, StoreError, StoreResult};

/// In-memory implementation of [`DocumentStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Quotes in insertion order
    quotes: RwLock<Vec<Quote>>,
    /// API keys in insertion order
    api_keys: RwLock<Vec<ApiKey>>,
    /// Usage counters keyed by composite usage id
    usage: RwLock<HashMap<String, ApiUsage>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_quote(&self, quote: &Quote) -> StoreResult<()> {
        let mut quotes = self.quotes.write().await;

        if quotes.iter().any(|q| q.text == quote.text) {
            return Err(StoreError::Conflict(format!(
                "quote text already exists: {}",
                quote.text
            )));
        }

        quotes.push(quote.clone());
        Ok(())
    }

    async fn find_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>> {
        let quotes = self.quotes.read().await;
        Ok(quotes.iter().filter(|q| filter.matches(q)).cloned().collect())
    }

    async fn find_quote_by_text(&self, text: &str) -> StoreResult<Option<Quote>> {
        let quotes = self.quotes.read().await;
        Ok(quotes.iter().find(|q| q.text == text).cloned())
    }

    async fn count_quotes(&self) -> StoreResult<u64> {
        Ok(self.quotes.read().await.len() as u64)
    }

    async fn quote_at_offset(&self, offset: u64) -> StoreResult<Option<Quote>> {
        let quotes = self.quotes.read().await;
        let index = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(quotes.get(index).cloned())
    }

    async fn count_distinct_authors(&self) -> StoreResult<u64> {
        let quotes = self.quotes.read().await;
        let authors: HashSet<&str> = quotes.iter().map(|q| q.author.as_str()).collect();
        Ok(authors.len() as u64)
    }

    async fn delete_quote(&self, id: &str) -> StoreResult<bool> {
        let mut quotes = self.quotes.write().await;
        let before = quotes.len();
        quotes.retain(|q| q.id != id);
        Ok(quotes.len() != before)
    }

    async fn sample_quote(&self) -> StoreResult<Option<Quote>> {
        let quotes = self.quotes.read().await;
        Ok(quotes.choose(&mut rand::thread_rng()).cloned())
    }

    async fn insert_api_key(&self, api_key: &ApiKey) -> StoreResult<()> {
        let mut api_keys = self.api_keys.write().await;

        if api_keys.iter().any(|k| k.key == api_key.key) {
            return Err(StoreError::Conflict("API key already exists".to_string()));
        }

        api_keys.push(api_key.clone());
        Ok(())
    }

    async fn find_api_key(&self, key: &str) -> StoreResult<Option<ApiKey>> {
        let api_keys = self.api_keys.read().await;
        Ok(api_keys.iter().find(|k| k.key == key).cloned())
    }

    async fn list_api_keys(&self) -> StoreResult<Vec<ApiKey>> {
        Ok(self.api_keys.read().await.clone())
    }

    async fn delete_api_key(&self, id: &str) -> StoreResult<bool> {
        let mut api_keys = self.api_keys.write().await;
        let before = api_keys.len();
        api_keys.retain(|k| k.id != id);
        Ok(api_keys.len() != before)
    }

    async fn increment_usage(
        &self,
        key: &str,
        endpoint: &str,
        method: &str,
    ) -> StoreResult<ApiUsage> {
        let mut usage = self.usage.write().await;

        let record = usage
            .entry(ApiUsage::usage_id(key, endpoint, method))
            .and_modify(|record| record.count += 1)
            .or_insert_with(|| ApiUsage {
                id: uuid::Uuid::new_v4().to_string(),
                key: key.to_string(),
                endpoint: endpoint.to_string(),
                method: method.to_string(),
                count: 1,
            });

        Ok(record.clone())
    }

    async fn list_usage(&self) -> StoreResult<Vec<ApiUsage>> {
        Ok(self.usage.read().await.values().cloned().collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewQuote;
    use chrono::Utc;

    fn quote(text: &str, author: &str) -> Quote {
        Quote::new(NewQuote::new(text, author, None))
    }

    #[tokio::test]
    async fn test_insert_quote_rejects_duplicate_text() {
        let store = MemoryStore::new();
        store.insert_quote(&quote("A", "B")).await.unwrap();

        let err = store.insert_quote(&quote("A", "C")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.count_quotes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_distinct_authors() {
        let store = MemoryStore::new();
        store.insert_quote(&quote("one", "X")).await.unwrap();
        store.insert_quote(&quote("two", "X")).await.unwrap();
        store.insert_quote(&quote("three", "Y")).await.unwrap();

        assert_eq!(store.count_distinct_authors().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_quote_at_offset_out_of_range() {
        let store = MemoryStore::new();
        store.insert_quote(&quote("only", "X")).await.unwrap();

        assert!(store.quote_at_offset(0).await.unwrap().is_some());
        assert!(store.quote_at_offset(1).await.unwrap().is_none());
        assert!(store.quote_at_offset(u64::MAX).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sample_empty_store() {
        let store = MemoryStore::new();
        assert!(store.sample_quote().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_quote_reports_missing() {
        let store = MemoryStore::new();
        let q = quote("A", "B");
        store.insert_quote(&q).await.unwrap();

        assert!(store.delete_quote(&q.id).await.unwrap());
        assert!(!store.delete_quote(&q.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_usage_creates_then_counts() {
        let store = MemoryStore::new();

        let first = store.increment_usage("k", "/api/quotes", "GET").await.unwrap();
        assert_eq!(first.count, 1);

        let second = store.increment_usage("k", "/api/quotes", "GET").await.unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.id, first.id);

        let other = store.increment_usage("k", "/api/quotes", "POST").await.unwrap();
        assert_eq!(other.count, 1);
        assert_eq!(store.list_usage().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_api_key_uniqueness() {
        let store = MemoryStore::new();
        let key = ApiKey {
            id: "id-1".to_string(),
            key: "abc".to_string(),
            created_at: Utc::now(),
        };
        store.insert_api_key(&key).await.unwrap();

        let clash = ApiKey {
            id: "id-2".to_string(),
            ..key.clone()
        };
        assert!(matches!(
            store.insert_api_key(&clash).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.find_api_key("abc").await.unwrap(), Some(key));
    }
}
