//! Usage report endpoint

use axum::{extract::State, Json};

use crate::db::models::ApiUsage;
use crate::error::ApiError;
use crate::server::state::AppState;

/// GET /api/usage
///
/// Sorted by key, then endpoint, then method, so the report is stable
/// regardless of store scan order.
pub async fn usage_report(State(state): State<AppState>) -> Result<Json<Vec<ApiUsage>>, ApiError> {
    let mut usage = state.usage_tracker.repository().report().await?;
    usage.sort_by(|a, b| {
        (&a.key, &a.endpoint, &a.method).cmp(&(&b.key, &b.endpoint, &b.method))
    });

    Ok(Json(usage))
}
