//! Idempotency Store Module
//!
//! The concurrency-safe, TTL-bound record store: one `CheckAndInsert`
//! contract, two interchangeable backends (in-process map and Redis).

use async_trait::async_trait;

use crate::error::Result;

mod key;
mod memory;
mod record;
mod redis;


// Re-export public types
pub use self::key::{compose, ComposedKey};
pub use self::memory::InMemoryStore;
pub use self::record::IdempotencyRecord;
pub use self::redis::RedisStore;

// == Public Constants ==
/// Maximum allowed idempotency key length in characters
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed namespace length in characters
pub const MAX_NAMESPACE_LENGTH: usize = 128;

// == Check Outcome ==
/// Result of a `check_and_insert` call.
///
/// When `is_new` is false, `record` is the winner's record: a duplicate
/// caller always observes the timestamps of the call that claimed the
/// key, never its own requested TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// True if this call claimed the key
    pub is_new: bool,
    /// The record now live under the key
    pub record: IdempotencyRecord,
}

// == Store Contract ==
/// The single-operation idempotency store contract.
///
/// Among any set of concurrent calls sharing a composite key with no
/// intervening expiry, exactly one observes `is_new = true`; all others
/// observe `is_new = false` together with the winner's record. Backends
/// must surface transport failures as errors and never default them to
/// either verdict.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Atomically claims `key` for `ttl_seconds` if no live record
    /// holds it, otherwise reports the existing claim.
    ///
    /// TTL validation and defaulting are the caller-facing layer's
    /// responsibility; backends trust `ttl_seconds` to be positive.
    async fn check_and_insert(&self, key: &ComposedKey, ttl_seconds: u64) -> Result<CheckOutcome>;
}
