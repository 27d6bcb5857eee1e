//! Error types for the idempotency service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Idempotency Error Enum ==
/// Unified error type for the idempotency service.
///
/// Validation and backend failures are surfaced to the caller as
/// distinct, retryable failures; they are never folded into a "new" or
/// "duplicate" verdict. Any error is fatal to the single request only,
/// never to the store's process-wide state.
#[derive(Error, Debug)]
pub enum IdempotencyError {
    /// Malformed key, namespace, or TTL; rejected before the store
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or invalid API key
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// Shared backend unreachable or timed out
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Unexpected internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for IdempotencyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IdempotencyError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            IdempotencyError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            IdempotencyError::BackendUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            IdempotencyError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the idempotency service.
pub type Result<T> = std::result::Result<T, IdempotencyError>;
