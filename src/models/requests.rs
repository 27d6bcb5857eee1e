//! Request DTOs for the idempotency service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::store::{MAX_KEY_LENGTH, MAX_NAMESPACE_LENGTH};

/// Request body for the check operation (POST /idempotency/check)
///
/// # Fields
/// - `key`: The idempotency key to claim
/// - `namespace`: Optional namespace scoping the key
/// - `ttl_seconds`: Optional TTL in seconds (uses the configured
///   default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    /// The idempotency key
    pub key: String,
    /// Optional namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Optional TTL in seconds, must be positive when present
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl CheckRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Idempotency key cannot be empty".to_string());
        }
        if self.key.chars().count() > MAX_KEY_LENGTH {
            return Some(format!(
                "Idempotency key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if let Some(namespace) = &self.namespace {
            if namespace.chars().count() > MAX_NAMESPACE_LENGTH {
                return Some(format!(
                    "Namespace exceeds maximum length of {} characters",
                    MAX_NAMESPACE_LENGTH
                ));
            }
        }
        if self.ttl_seconds == Some(0) {
            return Some("TTL must be at least 1 second".to_string());
        }
        None
    }
}
