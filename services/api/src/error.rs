//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Everything a handler can fail with. Converted at the handler
/// boundary into a `{"error": ...}` JSON body with the matching status.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed required input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired bearer token
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but refused by ownership/privacy/block rules
    #[error("forbidden")]
    Forbidden,

    /// Publishing refused because the account is suspended
    #[error("account suspended")]
    Suspended,

    /// Unknown id
    #[error("not found")]
    NotFound,

    /// Duplicate username
    #[error("username taken")]
    UsernameTaken,

    /// Request body exceeded the limit
    #[error("payload too large")]
    PayloadTooLarge,

    /// Wrong or missing content type
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Persistence failure
    #[error("store error: {0}")]
    Store(#[from] common::StoreError),

    /// Response serialization failure
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other internal failure
    #[error("internal error: {0}")]
    Internal(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            ApiError::Suspended => (StatusCode::FORBIDDEN, "account suspended".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::UsernameTaken => (StatusCode::CONFLICT, "username taken".to_string()),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
            }
            ApiError::UnsupportedMediaType(msg) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg.clone())
            }
            ApiError::Store(e) => {
                tracing::error!("store failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Json(e) => {
                tracing::error!("serialization failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!("internal failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Type alias for handler results
pub type ApiResult<T> = Result<T, ApiError>;
