//! Application state container
//!
//! Shared resources handed to every handler via Axum's state extraction.
//! Everything is built from one `Arc<dyn DocumentStore>`; there are no
//! globals.

use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{create_dynamodb_client, Settings, StoreBackend};
use crate::db::repositories::{ApiKeyRepository, QuoteRepository, UsageRepository};
use crate::db::{DocumentStore, DynamoDbStore, MemoryStore};
use crate::middleware::{HttpMetrics, RequestGate};
use crate::services::{ApiKeyGenerator, UsageTracker};

/// Shared application state
///
/// Cheap to clone; every member is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn DocumentStore>,
    pub quotes: QuoteRepository,
    pub api_keys: ApiKeyRepository,
    pub usage_tracker: UsageTracker,
    /// Pre-handler for quote-access routes
    pub gate: RequestGate,
    pub metrics: HttpMetrics,
    pub start_time: Instant,
}

impl AppState {
    /// Create the application state, connecting the configured store backend
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);

        let store: Arc<dyn DocumentStore> = match settings.store_backend {
            StoreBackend::Dynamodb => {
                tracing::debug!(
                    region = %settings.aws_region,
                    endpoint = ?settings.dynamodb_endpoint_url,
                    "Creating DynamoDB client"
                );
                let client = create_dynamodb_client(&settings).await;
                Arc::new(DynamoDbStore::new(settings.clone(), client))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
        };

        Self::with_store(settings, store)
    }

    /// Build the state around an existing store
    pub fn with_store(
        settings: Arc<Settings>,
        store: Arc<dyn DocumentStore>,
    ) -> anyhow::Result<Self> {
        let quotes = QuoteRepository::new(store.clone());
        let api_keys =
            ApiKeyRepository::new(store.clone(), ApiKeyGenerator::new(settings.api_key_bytes));
        let usage_tracker = UsageTracker::new(UsageRepository::new(store.clone()));
        let gate = RequestGate::standard(api_keys.clone(), usage_tracker.clone());
        let metrics = HttpMetrics::new().context("Failed to register HTTP metrics")?;

        tracing::info!(
            store = %settings.store_backend,
            gate_steps = ?gate.step_names(),
            "Application state initialized"
        );

        Ok(Self {
            settings,
            store,
            quotes,
            api_keys,
            usage_tracker,
            gate,
            metrics,
            start_time: Instant::now(),
        })
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
