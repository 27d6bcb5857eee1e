//! Idempotency Service - deduplicates retried operations
//!
//! Lets a caller atomically claim an idempotency key exactly once
//! within a time window, backed by an in-process map or a shared Redis
//! instance.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_sweep_task;
