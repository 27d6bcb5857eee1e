//! API Handlers
//!
//! HTTP request handlers for each idempotency service endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::debug;

use crate::api::auth::{ApiKeyProvider, API_KEY_HEADER};
use crate::error::{IdempotencyError, Result};
use crate::models::{CheckRequest, CheckResponse, HealthResponse};
use crate::store::{compose, IdempotencyStore};

/// Application state shared across all handlers.
///
/// Holds the store behind the trait object selected at startup; the
/// handlers never know which backend they are talking to.
#[derive(Clone)]
pub struct AppState {
    /// The idempotency store backend
    pub store: Arc<dyn IdempotencyStore>,
    /// API key validation
    pub auth: ApiKeyProvider,
    /// TTL applied when a request omits `ttl_seconds`
    pub default_ttl: u64,
}

impl AppState {
    /// Creates a new AppState around a constructed store.
    pub fn new(store: Arc<dyn IdempotencyStore>, auth: ApiKeyProvider, default_ttl: u64) -> Self {
        Self {
            store,
            auth,
            default_ttl,
        }
    }
}

/// Handler for POST /idempotency/check
///
/// Atomically claims the idempotency key, or reports the existing
/// claim. A fresh claim answers 200 OK; a duplicate answers 409
/// CONFLICT with the winner's timestamps, leaving the final
/// success/skip decision to the caller.
pub async fn check_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CheckRequest>,
) -> Result<(StatusCode, Json<CheckResponse>)> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if !state.auth.is_valid(api_key) {
        return Err(IdempotencyError::Unauthorized);
    }

    if let Some(error_msg) = req.validate() {
        return Err(IdempotencyError::Validation(error_msg));
    }

    debug!(key = %req.key, "checking idempotency key");

    // Timing spans key composition through the store call
    let started = Instant::now();
    let key = compose(&req.key, req.namespace.as_deref());
    let ttl_seconds = req.ttl_seconds.unwrap_or(state.default_ttl);

    let outcome = state.store.check_and_insert(&key, ttl_seconds).await?;
    let elapsed = started.elapsed();

    let status = if outcome.is_new {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };

    Ok((
        status,
        Json(CheckResponse::from_outcome(req.key, &outcome, elapsed)),
    ))
}

/// Handler for GET /idempotency/health
///
/// Returns health status of the service.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::up())
}

/// Handler for GET /idempotency/ping
pub async fn ping_handler() -> &'static str {
    "pong"
}
