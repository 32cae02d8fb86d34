//! Prometheus scrape endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use prometheus::TEXT_FORMAT;

use crate::error::ApiError;
use crate::server::state::AppState;

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to render metrics: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response())
}
