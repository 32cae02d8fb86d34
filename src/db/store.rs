//! Document store abstraction
//!
//! The [`DocumentStore`] trait is the seam between the repositories and the
//! persistence backend. Repositories hold an `Arc<dyn DocumentStore>` and
//! never talk to a concrete backend.
//!
//! Backends are responsible for the two concurrency guarantees the service
//! relies on:
//! - quote text and API key values are unique, even under concurrent inserts
//!   ([`StoreError::Conflict`] is returned to the loser)
//! - [`DocumentStore::increment_usage`] is a single atomic upsert

use async_trait::async_trait;
use rand::Rng;

use crate::db::models::{ApiKey, ApiUsage, Quote, QuoteFilter};

/// Errors raised by a document store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored document could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent collections for quotes, API keys and usage counters.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a quote. Fails with [`StoreError::Conflict`] if a quote with
    /// the same text already exists.
    async fn insert_quote(&self, quote: &Quote) -> StoreResult<()>;

    /// Find all quotes passing `filter`, in storage order
    async fn find_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>>;

    /// Find the quote with exactly this text
    async fn find_quote_by_text(&self, text: &str) -> StoreResult<Option<Quote>>;

    /// Count all quotes
    async fn count_quotes(&self) -> StoreResult<u64>;

    /// Fetch the quote at `offset` in storage order
    async fn quote_at_offset(&self, offset: u64) -> StoreResult<Option<Quote>>;

    /// Count distinct authors across all quotes
    async fn count_distinct_authors(&self) -> StoreResult<u64>;

    /// Delete a quote by id. Returns `false` if no such quote exists.
    async fn delete_quote(&self, id: &str) -> StoreResult<bool>;

    /// Pick one quote uniformly at random.
    ///
    /// The default counts the collection and skips to a random offset. The
    /// count and the fetch are separate reads, so a concurrent delete can
    /// make this return `None` on a non-empty collection. Backends with a
    /// native sampling primitive should override it.
    async fn sample_quote(&self) -> StoreResult<Option<Quote>> {
        let total = self.count_quotes().await?;
        if total == 0 {
            return Ok(None);
        }

        let offset = rand::thread_rng().gen_range(0..total);
        self.quote_at_offset(offset).await
    }

    /// Insert an API key. Fails with [`StoreError::Conflict`] if the key
    /// value is already taken.
    async fn insert_api_key(&self, api_key: &ApiKey) -> StoreResult<()>;

    /// Find an API key record by its key value
    async fn find_api_key(&self, key: &str) -> StoreResult<Option<ApiKey>>;

    /// List all API key records, in storage order
    async fn list_api_keys(&self) -> StoreResult<Vec<ApiKey>>;

    /// Delete an API key record by id. Returns `false` if no such record exists.
    async fn delete_api_key(&self, id: &str) -> StoreResult<bool>;

    /// Atomically increment the counter for (key, endpoint, method), creating
    /// it with a count of 1 if absent. Returns the updated record.
    async fn increment_usage(&self, key: &str, endpoint: &str, method: &str)
        -> StoreResult<ApiUsage>;

    /// List all usage records
    async fn list_usage(&self) -> StoreResult<Vec<ApiUsage>>;

    /// Check whether the store is reachable
    async fn health_check(&self) -> bool;
}
