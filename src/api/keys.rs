//! API key administration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::api::MessageResponse;
use crate::db::models::ApiKey;
use crate::error::ApiError;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct GeneratedKeyResponse {
    pub key: String,
}

/// POST /api/generate-key
pub async fn generate_key(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<GeneratedKeyResponse>), ApiError> {
    let issued = state.api_keys.issue().await?;

    Ok((
        StatusCode::CREATED,
        Json(GeneratedKeyResponse { key: issued.key }),
    ))
}

/// GET /api/keys, newest first
pub async fn list_keys(State(state): State<AppState>) -> Result<Json<Vec<ApiKey>>, ApiError> {
    Ok(Json(state.api_keys.list().await?))
}

/// DELETE /api/delete-key/:id
pub async fn delete_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.api_keys.revoke(&id).await?;

    Ok(Json(MessageResponse::new("API key deleted successfully")))
}
