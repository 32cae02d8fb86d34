//! Quote endpoints
//!
//! `GET /api/quotes` is open; random, create and delete are gated by the
//! request gate (see `server::routes`).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::api::extract::ValidatedJson;
use crate::api::MessageResponse;
use crate::db::models::{NewQuote, Quote, QuoteFilter};
use crate::error::ApiError;
use crate::server::state::AppState;

/// Body of `POST /api/quotes`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    #[validate(
        length(min = 1, max = 2000, message = "must be 1 to 2000 characters"),
        custom(function = "not_blank")
    )]
    pub text: String,

    #[validate(
        length(min = 1, max = 200, message = "must be 1 to 200 characters"),
        custom(function = "not_blank")
    )]
    pub author: String,

    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub author_link: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuotesParams {
    pub author: Option<String>,
}

/// GET /api/quotes
pub async fn list_quotes(
    State(state): State<AppState>,
    Query(params): Query<ListQuotesParams>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    let filter = match params.author.as_deref().map(str::trim) {
        Some(author) if !author.is_empty() => QuoteFilter::by_author(author),
        _ => QuoteFilter::default(),
    };

    Ok(Json(state.quotes.list(&filter).await?))
}

/// GET /api/quotes/random
pub async fn random_quote(State(state): State<AppState>) -> Result<Json<Quote>, ApiError> {
    Ok(Json(state.quotes.pick_random().await?))
}

/// POST /api/quotes
pub async fn create_quote(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<Quote>), ApiError> {
    let new_quote = NewQuote::new(&body.text, &body.author, body.author_link.as_deref());
    let quote = state.quotes.insert(new_quote).await?;

    Ok((StatusCode::CREATED, Json(quote)))
}

/// DELETE /api/quotes/:id
pub async fn delete_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.quotes.delete(&id).await?;

    Ok(Json(MessageResponse::new("Quote deleted successfully")))
}
