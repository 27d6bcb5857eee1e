//! Response DTOs for the idempotency service API
//!
//! Defines the structure of outgoing HTTP response bodies, including
//! the response assembler that wraps a store outcome with timing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::CheckOutcome;

/// Response body for the check operation (POST /idempotency/check)
///
/// `is_duplicate` is always the logical complement of `is_new`; the
/// assembler keeps them synchronized. Timestamps are the winner's: a
/// duplicate caller never sees its own requested TTL reflected here.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    /// The raw idempotency key from the request
    pub key: String,
    /// True if this call claimed the key
    pub is_new: bool,
    /// True if the key was already claimed
    pub is_duplicate: bool,
    /// When the key was first claimed
    pub created_at: DateTime<Utc>,
    /// When the claim stops blocking reuse
    pub expires_at: DateTime<Utc>,
    /// Elapsed time from just before key composition to just after the
    /// store call returned
    pub processing_time_nanos: u64,
}

impl CheckResponse {
    /// Assembles the caller-facing response from a store outcome.
    ///
    /// Never mutates the record.
    pub fn from_outcome(key: impl Into<String>, outcome: &CheckOutcome, elapsed: Duration) -> Self {
        Self {
            key: key.into(),
            is_new: outcome.is_new,
            is_duplicate: !outcome.is_new,
            created_at: outcome.record.created_at,
            expires_at: outcome.record.expires_at,
            processing_time_nanos: elapsed.as_nanos() as u64,
        }
    }
}

/// Response body for the health endpoint (GET /idempotency/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "UP")
    pub status: String,
    /// Service name
    pub service: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Human-readable status message
    pub message: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn up() -> Self {
        Self {
            status: "UP".to_string(),
            service: "idempotency-service".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            message: "Service is healthy and operational".to_string(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{compose, IdempotencyRecord};

    fn sample_outcome(is_new: bool) -> CheckOutcome {
        let key = compose("order-1", None);
        CheckOutcome {
            is_new,
            record: IdempotencyRecord::new(&key, Utc::now(), 60),
        }
    }

    #[test]
    fn test_check_response_new() {
        let outcome = sample_outcome(true);
        let resp = CheckResponse::from_outcome("order-1", &outcome, Duration::from_micros(250));

        assert!(resp.is_new);
        assert!(!resp.is_duplicate);
        assert_eq!(resp.created_at, outcome.record.created_at);
        assert_eq!(resp.expires_at, outcome.record.expires_at);
        assert_eq!(resp.processing_time_nanos, 250_000);
    }

    #[test]
    fn test_check_response_duplicate_flags_complement() {
        let outcome = sample_outcome(false);
        let resp = CheckResponse::from_outcome("order-1", &outcome, Duration::ZERO);

        assert!(!resp.is_new);
        assert!(resp.is_duplicate);
    }

    #[test]
    fn test_check_response_serialize() {
        let outcome = sample_outcome(true);
        let resp = CheckResponse::from_outcome("order-1", &outcome, Duration::from_nanos(1));
        let json = serde_json::to_string(&resp).unwrap();

        assert!(json.contains("\"key\":\"order-1\""));
        assert!(json.contains("\"is_new\":true"));
        assert!(json.contains("\"is_duplicate\":false"));
        assert!(json.contains("created_at"));
        assert!(json.contains("expires_at"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::up();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("UP"));
        assert!(json.contains("idempotency-service"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
