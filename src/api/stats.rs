//! Collection statistics endpoint

use axum::{extract::State, Json};

use crate::db::models::QuoteStats;
use crate::error::ApiError;
use crate::server::state::AppState;

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<QuoteStats>, ApiError> {
    Ok(Json(state.quotes.stats().await?))
}
