//! API Routes
//!
//! Configures the Axum router with all idempotency service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{check_handler, health_handler, ping_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /idempotency/check` - Atomically claim an idempotency key
/// - `GET /idempotency/health` - Health check endpoint
/// - `GET /idempotency/ping` - Liveness probe
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/idempotency/check", post(check_handler))
        .route("/idempotency/health", get(health_handler))
        .route("/idempotency/ping", get(ping_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
