//! Request gate middleware
//!
//! Quote-access routes are guarded by a [`RequestGate`]: an ordered list of
//! [`GateStep`]s evaluated before the handler runs. The standard gate
//! requires an `x-api-key` header, checks it against the key registry, then
//! records one usage hit for (key, endpoint, method).

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::db::repositories::ApiKeyRepository;
use crate::error::ErrorResponse;
use crate::services::UsageTracker;
use crate::utils::mask_key;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// Authentication Errors
// ============================================================================

/// Reasons the gate rejects a request
#[derive(Debug)]
pub enum AuthError {
    /// No API key provided in request
    MissingApiKey,
    /// API key is not registered
    InvalidApiKey,
    /// The key registry could not be consulted
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AuthError::MissingApiKey => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "Missing API key. Include the 'x-api-key' header in your request.",
            ),
            AuthError::InvalidApiKey => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "Invalid API key.",
            ),
            AuthError::InternalError(msg) => {
                tracing::error!(error = %msg, "Key validation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "api_error",
                    "An internal error occurred during authentication.",
                )
            }
        };

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

// ============================================================================
// Gate steps
// ============================================================================

/// What a gate step sees of the inbound request
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub api_key: Option<&'a str>,
    pub endpoint: &'a str,
    pub method: &'a str,
}

/// Outcome of a single gate step
#[derive(Debug)]
pub enum GateDecision {
    Continue,
    Halt(AuthError),
}

/// One check in the gate pipeline
#[async_trait]
pub trait GateStep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, request: &GateRequest<'_>) -> GateDecision;
}

/// Rejects requests without a non-empty key
pub struct RequireKeyPresent;

#[async_trait]
impl GateStep for RequireKeyPresent {
    fn name(&self) -> &'static str {
        "require_key_present"
    }

    async fn check(&self, request: &GateRequest<'_>) -> GateDecision {
        match request.api_key {
            Some(key) if !key.is_empty() => GateDecision::Continue,
            _ => {
                tracing::warn!(endpoint = %request.endpoint, "Request missing API key");
                GateDecision::Halt(AuthError::MissingApiKey)
            }
        }
    }
}

/// Rejects keys that are not in the registry
pub struct RequireRegisteredKey {
    registry: ApiKeyRepository,
}

impl RequireRegisteredKey {
    pub fn new(registry: ApiKeyRepository) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl GateStep for RequireRegisteredKey {
    fn name(&self) -> &'static str {
        "require_registered_key"
    }

    async fn check(&self, request: &GateRequest<'_>) -> GateDecision {
        let Some(key) = request.api_key else {
            return GateDecision::Halt(AuthError::MissingApiKey);
        };

        match self.registry.is_valid(key).await {
            Ok(true) => {
                tracing::debug!(key = %mask_key(key), "API key authenticated");
                GateDecision::Continue
            }
            Ok(false) => {
                tracing::warn!(key = %mask_key(key), "Invalid API key");
                GateDecision::Halt(AuthError::InvalidApiKey)
            }
            Err(e) => GateDecision::Halt(AuthError::InternalError(e.to_string())),
        }
    }
}

/// Counts the request against its key. Never halts.
pub struct RecordUsage {
    tracker: UsageTracker,
}

impl RecordUsage {
    pub fn new(tracker: UsageTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl GateStep for RecordUsage {
    fn name(&self) -> &'static str {
        "record_usage"
    }

    async fn check(&self, request: &GateRequest<'_>) -> GateDecision {
        if let Some(key) = request.api_key {
            self.tracker
                .record(key, request.endpoint, request.method)
                .await;
        }
        GateDecision::Continue
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Ordered gate steps; the first `Halt` wins
#[derive(Clone)]
pub struct RequestGate {
    steps: Arc<Vec<Box<dyn GateStep>>>,
}

impl RequestGate {
    pub fn new(steps: Vec<Box<dyn GateStep>>) -> Self {
        Self {
            steps: Arc::new(steps),
        }
    }

    /// Key present, key registered, then usage recorded
    pub fn standard(registry: ApiKeyRepository, tracker: UsageTracker) -> Self {
        Self::new(vec![
            Box::new(RequireKeyPresent),
            Box::new(RequireRegisteredKey::new(registry)),
            Box::new(RecordUsage::new(tracker)),
        ])
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order, stopping at the first rejection
    pub async fn evaluate(&self, request: &GateRequest<'_>) -> Result<(), AuthError> {
        for step in self.steps.iter() {
            if let GateDecision::Halt(err) = step.check(request).await {
                tracing::debug!(step = step.name(), "Request halted by gate");
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Middleware applying a [`RequestGate`] to the wrapped routes.
///
/// The usage endpoint is the concrete request path (before any `nest`
/// prefix stripping) and the method is upper-case.
pub async fn require_api_key(
    State(gate): State<RequestGate>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let api_key = extract_api_key(&request);
    let endpoint = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().as_str().to_uppercase();

    gate.evaluate(&GateRequest {
        api_key: api_key.as_deref(),
        endpoint: &endpoint,
        method: &method,
    })
    .await?;

    Ok(next.run(request).await)
}

/// Extract the API key from the `x-api-key` header
pub fn extract_api_key<B>(request: &Request<B>) -> Option<String> {
    request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::repositories::UsageRepository;
    use crate::db::store::DocumentStore;
    use crate::services::ApiKeyGenerator;

    fn gate() -> (RequestGate, ApiKeyRepository, UsageRepository) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let keys = ApiKeyRepository::new(store.clone(), ApiKeyGenerator::default());
        let usage = UsageRepository::new(store);
        let gate = RequestGate::standard(keys.clone(), UsageTracker::new(usage.clone()));
        (gate, keys, usage)
    }

    fn request<'a>(key: Option<&'a str>) -> GateRequest<'a> {
        GateRequest {
            api_key: key,
            endpoint: "/api/quotes/random",
            method: "GET",
        }
    }

    #[test]
    fn test_standard_step_order() {
        let (gate, _, _) = gate();
        assert_eq!(
            gate.step_names(),
            vec!["require_key_present", "require_registered_key", "record_usage"]
        );
    }

    #[tokio::test]
    async fn test_missing_key_halts_without_usage() {
        let (gate, _, usage) = gate();

        let result = gate.evaluate(&request(None)).await;
        assert!(matches!(result, Err(AuthError::MissingApiKey)));

        let result = gate.evaluate(&request(Some(""))).await;
        assert!(matches!(result, Err(AuthError::MissingApiKey)));

        assert!(usage.report().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_key_halts_without_usage() {
        let (gate, _, usage) = gate();

        let result = gate.evaluate(&request(Some("deadbeefdeadbeef"))).await;
        assert!(matches!(result, Err(AuthError::InvalidApiKey)));
        assert!(usage.report().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_valid_key_records_usage() {
        let (gate, keys, usage) = gate();
        let issued = keys.issue().await.unwrap();

        gate.evaluate(&request(Some(&issued.key))).await.unwrap();
        gate.evaluate(&request(Some(&issued.key))).await.unwrap();

        let report = usage.report().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].key, issued.key);
        assert_eq!(report[0].method, "GET");
        assert_eq!(report[0].count, 2);
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::MissingApiKey.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidApiKey.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::InternalError("down".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_extract_api_key_header_only() {
        let req = Request::builder()
            .header("authorization", "Bearer abc")
            .body(())
            .unwrap();
        assert_eq!(extract_api_key(&req), None);

        let req = Request::builder()
            .header(API_KEY_HEADER, "abc123")
            .body(())
            .unwrap();
        assert_eq!(extract_api_key(&req).as_deref(), Some("abc123"));
    }
}
