//! Usage repository
//!
//! Data access layer for per-key usage counters.

use std::sync::Arc;

use crate::db::models::ApiUsage;
use crate::db::store::{DocumentStore, StoreError};
use crate::utils::mask_key;

/// Repository for usage tracking operations
#[derive(Clone)]
pub struct UsageRepository {
    store: Arc<dyn DocumentStore>,
}

impl UsageRepository {
    /// Create a new usage repository
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Count one request for (key, endpoint, method)
    pub async fn record(
        &self,
        key: &str,
        endpoint: &str,
        method: &str,
    ) -> Result<ApiUsage, UsageError> {
        let usage = self.store.increment_usage(key, endpoint, method).await?;

        tracing::debug!(
            api_key = %mask_key(key),
            endpoint = %endpoint,
            method = %method,
            count = usage.count,
            "Recorded usage"
        );

        Ok(usage)
    }

    /// All usage counters, unordered
    pub async fn report(&self) -> Result<Vec<ApiUsage>, UsageError> {
        Ok(self.store.list_usage().await?)
    }
}

/// Errors that can occur during usage operations
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_lose_no_updates() {
        let repo = UsageRepository::new(Arc::new(MemoryStore::new()));

        let tasks = (0..100).map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.record("key", "/api/quotes/random", "GET").await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let report = repo.report().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].count, 100);
        assert_eq!(report[0].endpoint, "/api/quotes/random");
    }

    #[tokio::test]
    async fn test_triples_are_counted_separately() {
        let repo = UsageRepository::new(Arc::new(MemoryStore::new()));
        repo.record("k1", "/api/quotes", "POST").await.unwrap();
        repo.record("k2", "/api/quotes", "POST").await.unwrap();
        repo.record("k1", "/api/quotes/random", "GET").await.unwrap();

        assert_eq!(repo.report().await.unwrap().len(), 3);
    }
}
