//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    http::HeaderName,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{health, keys, metrics, quotes, stats, usage};
use crate::middleware::{
    auth::require_api_key,
    logging::{log_request, REQUEST_ID_HEADER, TRACE_ID_HEADER},
    metrics::track_metrics,
};
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Request gate: key present, key registered, usage recorded.
    // Applied per method so GET /api/quotes stays open.
    let gate = middleware::from_fn_with_state(state.gate.clone(), require_api_key);

    let quote_routes = Router::new()
        .route(
            "/quotes",
            get(quotes::list_quotes).merge(post(quotes::create_quote).route_layer(gate.clone())),
        )
        .route(
            "/quotes/random",
            get(quotes::random_quote).route_layer(gate.clone()),
        )
        .route(
            "/quotes/:id",
            delete(quotes::delete_quote).route_layer(gate),
        );

    let admin_routes = Router::new()
        .route("/stats", get(stats::stats))
        .route("/generate-key", post(keys::generate_key))
        .route("/keys", get(keys::list_keys))
        .route("/delete-key/:id", delete(keys::delete_key))
        .route("/usage", get(usage::usage_report));

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness));

    Router::new()
        .nest(
            "/api",
            quote_routes.merge(admin_routes).merge(health_routes),
        )
        .route("/metrics", get(metrics::metrics))
        // Matched route template is only known inside the router
        .route_layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(create_cors_layer())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Create CORS layer with permissive settings
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(TRACE_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}
