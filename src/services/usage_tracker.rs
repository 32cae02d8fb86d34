//! Usage tracking service
//!
//! Best-effort recording of gated requests into the usage ledger. Failures
//! are logged and swallowed so that usage accounting never degrades the
//! request being served.

use crate::db::repositories::UsageRepository;
use crate::utils::mask_key;

/// Service for tracking API usage per (key, endpoint, method).
#[derive(Clone)]
pub struct UsageTracker {
    usage_repo: UsageRepository,
}

impl UsageTracker {
    /// Create a new usage tracker.
    pub fn new(usage_repo: UsageRepository) -> Self {
        Self { usage_repo }
    }

    /// Record one request.
    ///
    /// Never fails; store errors are logged at `warn`.
    pub async fn record(&self, key: &str, endpoint: &str, method: &str) {
        if let Err(e) = self.usage_repo.record(key, endpoint, method).await {
            tracing::warn!(
                api_key = %mask_key(key),
                endpoint = %endpoint,
                method = %method,
                error = %e,
                "Failed to record usage, continuing"
            );
        }
    }

    /// Access the underlying repository (for reporting)
    pub fn repository(&self) -> &UsageRepository {
        &self.usage_repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_record_counts() {
        let tracker = UsageTracker::new(UsageRepository::new(Arc::new(MemoryStore::new())));

        tracker.record("key", "/api/quotes", "POST").await;
        tracker.record("key", "/api/quotes", "POST").await;

        let report = tracker.repository().report().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].count, 2);
    }
}
