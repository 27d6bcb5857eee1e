//! API Module
//!
//! HTTP handlers and routing for the idempotency service REST API.
//!
//! # Endpoints
//! - `POST /idempotency/check` - Atomically claim an idempotency key
//! - `GET /idempotency/health` - Health check endpoint
//! - `GET /idempotency/ping` - Liveness probe

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::ApiKeyProvider;
pub use handlers::*;
pub use routes::create_router;
