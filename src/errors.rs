use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Request-level error for the HTTP surface and the pipelines behind it.
///
/// The stage-specific variants exist so a failed ask request reports which
/// backend broke, not just "internal error".
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("vector search error: {0}")]
    Search(String),
    #[error("completion error: {0}")]
    Completion(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Embedding(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Embedding error: {}", msg),
            ),
            ApiError::Search(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Vector search error: {}", msg),
            ),
            ApiError::Completion(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Completion error: {}", msg),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
