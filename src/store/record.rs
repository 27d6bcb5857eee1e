//! Idempotency Record Module
//!
//! Defines the immutable value stored for each claimed idempotency key.

use chrono::{DateTime, Duration, Utc};

use crate::store::key::ComposedKey;

// == Idempotency Record ==
/// A single occurrence of a claimed idempotency key.
///
/// Records are immutable once inserted; an expired record may only be
/// superseded by an atomic compare-and-replace with a fresh one.
/// `PartialEq` matters here: compare-and-replace and the sweep's
/// remove-if-matches both compare against the exact record that was
/// observed.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    /// The composite storage key (unique per store)
    pub composite_key: String,
    /// The caller-supplied idempotency key
    pub raw_key: String,
    /// The namespace the key was scoped under, if any
    pub namespace: Option<String>,
    /// When the key was first claimed
    pub created_at: DateTime<Utc>,
    /// When the claim stops blocking reuse
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    // == Constructor ==
    /// Creates a record claiming `key` at `now` for `ttl_seconds`.
    pub fn new(key: &ComposedKey, now: DateTime<Utc>, ttl_seconds: u64) -> Self {
        Self {
            composite_key: key.as_str().to_string(),
            raw_key: key.raw_key().to_string(),
            namespace: key.namespace().map(str::to_string),
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds as i64),
        }
    }

    // == Is Expired ==
    /// Checks whether the record has expired as of `now`.
    ///
    /// A record is expired only when `expires_at` is strictly before
    /// `now`; a record whose expiry instant equals `now` still blocks
    /// reuse.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::key::compose;

    #[test]
    fn test_record_fields_from_composed_key() {
        let key = compose("order-1", Some("billing"));
        let now = Utc::now();
        let record = IdempotencyRecord::new(&key, now, 60);

        assert_eq!(record.composite_key, "billing:order-1");
        assert_eq!(record.raw_key, "order-1");
        assert_eq!(record.namespace.as_deref(), Some("billing"));
        assert_eq!(record.created_at, now);
        assert_eq!(record.expires_at, now + Duration::seconds(60));
    }

    #[test]
    fn test_record_not_expired_before_ttl() {
        let key = compose("k", None);
        let now = Utc::now();
        let record = IdempotencyRecord::new(&key, now, 10);

        assert!(!record.is_expired_at(now));
        assert!(!record.is_expired_at(now + Duration::seconds(9)));
    }

    #[test]
    fn test_record_expired_after_ttl() {
        let key = compose("k", None);
        let now = Utc::now();
        let record = IdempotencyRecord::new(&key, now, 10);

        assert!(record.is_expired_at(now + Duration::seconds(11)));
    }

    #[test]
    fn test_expiry_boundary_still_live() {
        // Expired means strictly before now: at the exact expiry
        // instant the record still counts as live.
        let key = compose("k", None);
        let now = Utc::now();
        let record = IdempotencyRecord::new(&key, now, 10);

        assert!(!record.is_expired_at(record.expires_at));
        assert!(record.is_expired_at(record.expires_at + Duration::milliseconds(1)));
    }
}
