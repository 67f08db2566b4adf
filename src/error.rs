//! Error types for the cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

// == Cache Error Enum ==
/// Unified error type for the cache service.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty after normalization
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Serialized value is above the size limit
    #[error("Value too large: {0}")]
    ValueTooLarge(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A `remember`/warm-up callback failed
    #[error("Value generation failed: {0}")]
    Generation(String),

    /// The external cache layer failed
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// HTTP status used when this error reaches the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::InvalidKey(_)
            | CacheError::InvalidRequest(_)
            | CacheError::Serialization(_) => StatusCode::BAD_REQUEST,
            CacheError::ValueTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Generation(_) | CacheError::Io(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ApiResponse::failure(self.to_string()));
        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
