//! API key repository
//!
//! Issuance, listing, revocation and validation of API keys.

use chrono::Utc;
use std::sync::Arc;

use crate::db::models::ApiKey;
use crate::db::store::{DocumentStore, StoreError};
use crate::services::key_generator::ApiKeyGenerator;
use crate::utils::mask_key;

/// Attempts at generating a key that is not already taken
const MAX_ISSUE_ATTEMPTS: usize = 5;

/// Repository for API key operations
#[derive(Clone)]
pub struct ApiKeyRepository {
    store: Arc<dyn DocumentStore>,
    generator: ApiKeyGenerator,
}

impl ApiKeyRepository {
    /// Create a new API key repository
    pub fn new(store: Arc<dyn DocumentStore>, generator: ApiKeyGenerator) -> Self {
        Self { store, generator }
    }

    /// Issue and persist a new key.
    ///
    /// Regenerates on the (practically impossible) collision with an
    /// existing key.
    pub async fn issue(&self) -> Result<ApiKey, ApiKeyError> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let api_key = ApiKey {
                id: uuid::Uuid::new_v4().to_string(),
                key: self.generator.generate(),
                created_at: Utc::now(),
            };

            match self.store.insert_api_key(&api_key).await {
                Ok(()) => {
                    tracing::info!(
                        key_id = %api_key.id,
                        key = %mask_key(&api_key.key),
                        "Issued API key"
                    );
                    return Ok(api_key);
                }
                Err(StoreError::Conflict(_)) => {
                    tracing::warn!(attempt, "Generated API key collided, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiKeyError::Exhausted(MAX_ISSUE_ATTEMPTS))
    }

    /// List all keys, most recently created first
    pub async fn list(&self) -> Result<Vec<ApiKey>, ApiKeyError> {
        let mut keys = self.store.list_api_keys().await?;
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    /// Revoke a key by record id
    pub async fn revoke(&self, id: &str) -> Result<(), ApiKeyError> {
        if !self.store.delete_api_key(id).await? {
            return Err(ApiKeyError::NotFound);
        }

        tracing::info!(key_id = %id, "Revoked API key");
        Ok(())
    }

    /// Check whether a key exists in the registry
    pub async fn is_valid(&self, key: &str) -> Result<bool, ApiKeyError> {
        Ok(self.store.find_api_key(key).await?.is_some())
    }
}

/// Errors that can occur during API key operations
#[derive(Debug, thiserror::Error)]
pub enum ApiKeyError {
    #[error("API key not found")]
    NotFound,

    #[error("Could not generate a unique API key after {0} attempts")]
    Exhausted(usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn repo() -> ApiKeyRepository {
        ApiKeyRepository::new(Arc::new(MemoryStore::new()), ApiKeyGenerator::default())
    }

    #[tokio::test]
    async fn test_issue_and_validate() {
        let repo = repo();
        let issued = repo.issue().await.unwrap();

        assert_eq!(issued.key.len(), 32);
        assert!(repo.is_valid(&issued.key).await.unwrap());
        assert!(!repo.is_valid("not-a-key").await.unwrap());
    }

    #[tokio::test]
    async fn test_successive_issues_differ() {
        let repo = repo();
        let first = repo.issue().await.unwrap();
        let second = repo.issue().await.unwrap();

        assert_ne!(first.key, second.key);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = repo();
        let first = repo.issue().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.issue().await.unwrap();

        let keys = repo.list().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].id, second.id);
        assert_eq!(keys[1].id, first.id);
    }

    #[tokio::test]
    async fn test_revoke() {
        let repo = repo();
        let issued = repo.issue().await.unwrap();

        repo.revoke(&issued.id).await.unwrap();
        assert!(!repo.is_valid(&issued.key).await.unwrap());
        assert!(matches!(
            repo.revoke(&issued.id).await,
            Err(ApiKeyError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_revoke_by_key_value_is_not_found() {
        let repo = repo();
        let issued = repo.issue().await.unwrap();

        // Revocation is by record id, not by the key itself
        assert!(matches!(
            repo.revoke(&issued.key).await,
            Err(ApiKeyError::NotFound)
        ));
        assert!(repo.is_valid(&issued.key).await.unwrap());
    }
}
