//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repositories::{ApiKeyError, QuoteError, UsageError};
use crate::db::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP status and error type string for this error
    pub fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found_error"),
            ApiError::Duplicate(_) => (StatusCode::BAD_REQUEST, "duplicate_error"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            ApiError::DatabaseError(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "api_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::Duplicate(msg)
            | ApiError::InvalidRequest(msg) => msg,
            ApiError::DatabaseError(msg) => {
                tracing::error!(error = %msg, "Store failure while serving request");
                "The data store is currently unavailable.".to_string()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal error while serving request");
                "An internal error occurred.".to_string()
            }
        };

        (status, Json(ErrorResponse::new(error_type, message))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::NotFound => ApiError::NotFound("Quote not found".to_string()),
            QuoteError::Duplicate => {
                ApiError::Duplicate("A quote with this text already exists".to_string())
            }
            QuoteError::Store(e) => e.into(),
        }
    }
}

impl From<ApiKeyError> for ApiError {
    fn from(err: ApiKeyError) -> Self {
        match err {
            ApiKeyError::NotFound => ApiError::NotFound("API key not found".to_string()),
            ApiKeyError::Exhausted(_) => ApiError::Internal(anyhow::anyhow!(err)),
            ApiKeyError::Store(e) => e.into(),
        }
    }
}

impl From<UsageError> for ApiError {
    fn from(err: UsageError) -> Self {
        match err {
            UsageError::Store(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        fields.sort();

        ApiError::InvalidRequest(format!("Invalid fields: {}", fields.join("; ")))
    }
}

/// Error body returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            response_type: "error".to_string(),
            error: ErrorDetail {
                error_type: error_type.into(),
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Duplicate("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::DatabaseError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_quote_error_mapping() {
        assert!(matches!(ApiError::from(QuoteError::NotFound), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from(QuoteError::Duplicate), ApiError::Duplicate(_)));
        assert!(matches!(
            ApiError::from(QuoteError::Store(StoreError::Unavailable("down".into()))),
            ApiError::DatabaseError(_)
        ));
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("not_found_error", "gone")).unwrap();
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "not_found_error");
        assert_eq!(body["error"]["message"], "gone");
    }
}
