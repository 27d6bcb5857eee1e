//! Redis Store Module
//!
//! Idempotency store delegating to Redis `SET NX EX`, the external
//! atomic set-if-absent-with-TTL primitive. At-most-one-winner holds
//! exactly as far as that primitive's atomicity does.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::error::{IdempotencyError, Result};
use crate::store::key::ComposedKey;
use crate::store::record::IdempotencyRecord;
use crate::store::{CheckOutcome, IdempotencyStore};

/// Prefix applied to every key stored in Redis.
const KEY_PREFIX: &str = "idempotency:";

// == Redis Store ==
/// Idempotency store backed by a shared Redis instance.
///
/// The stored value under each key is the claim instant in epoch
/// milliseconds; Redis expiry replaces the in-process sweep. Every
/// round trip is bounded by the configured timeout and transport
/// failures surface as [`IdempotencyError::BackendUnavailable`] -
/// never as a "new" or "duplicate" verdict.
pub struct RedisStore {
    /// Redis client handle
    client: redis::Client,
    /// Per-call timeout for each round trip
    timeout: Duration,
}

impl RedisStore {
    // == Constructor ==
    /// Connects to Redis at `host:port` and verifies it answers PING,
    /// so a misconfigured backend fails at startup instead of on the
    /// first check.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let url = format!("redis://{}:{}", host, port);
        let client = redis::Client::open(url.as_str()).map_err(|err| {
            IdempotencyError::BackendUnavailable(format!("invalid redis target {}: {}", url, err))
        })?;

        let store = Self { client, timeout };
        let mut con = store.connection().await?;
        store
            .bounded(redis::cmd("PING").query_async::<_, String>(&mut con))
            .await?;

        Ok(store)
    }

    /// Opens a multiplexed connection, bounded by the call timeout.
    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.bounded(self.client.get_multiplexed_tokio_connection())
            .await
    }

    /// Runs one Redis round trip under the per-call timeout, mapping
    /// both transport errors and the timeout itself to
    /// `BackendUnavailable`.
    async fn bounded<T>(&self, fut: impl Future<Output = redis::RedisResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(IdempotencyError::BackendUnavailable(err.to_string())),
            Err(_) => Err(IdempotencyError::BackendUnavailable(format!(
                "redis call exceeded {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Returns the Redis key a composite key is stored under.
fn storage_key(key: &ComposedKey) -> String {
    format!("{}{}", KEY_PREFIX, key.as_str())
}

/// Reconstructs the winner's creation instant from the stored epoch
/// milliseconds, falling back to `now` when the value could not be
/// observed or parsed.
fn created_at_from(stored_millis: Option<i64>, now: DateTime<Utc>) -> DateTime<Utc> {
    stored_millis
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or(now)
}

/// Reconstructs the expiry instant from the remaining TTL reported by
/// Redis. TTL replies of -1 (no expiry) and -2 (key gone) both fall
/// back to `now`.
fn expires_at_from(ttl_remaining: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    if ttl_remaining > 0 {
        now + chrono::Duration::seconds(ttl_remaining)
    } else {
        now
    }
}

#[async_trait]
impl IdempotencyStore for RedisStore {
    async fn check_and_insert(&self, key: &ComposedKey, ttl_seconds: u64) -> Result<CheckOutcome> {
        let storage_key = storage_key(key);
        let now = Utc::now();
        let mut con = self.connection().await?;

        // Atomic set-if-absent with TTL; the value is the claim instant
        let reply: Option<String> = self
            .bounded(
                redis::cmd("SET")
                    .arg(&storage_key)
                    .arg(now.timestamp_millis())
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_seconds)
                    .query_async(&mut con),
            )
            .await?;

        if reply.is_some() {
            debug!(key = key.as_str(), "new idempotency key inserted");
            return Ok(CheckOutcome {
                is_new: true,
                record: IdempotencyRecord::new(key, now, ttl_seconds),
            });
        }

        // Already present: read back the winner's creation value and the
        // remaining TTL. The write and these reads are not one atomic
        // snapshot - if the key expired in between, report a duplicate
        // with best-effort timestamps rather than failing the call, since
        // erroring here would make the client retry into the same race.
        let stored_millis: Option<i64> = self.bounded(con.get(&storage_key)).await?;
        let ttl_remaining: i64 = self
            .bounded(redis::cmd("TTL").arg(&storage_key).query_async(&mut con))
            .await?;

        if stored_millis.is_none() {
            warn!(
                key = key.as_str(),
                "key expired between write and read-back, using best-effort timestamps"
            );
        }

        let created_at = created_at_from(stored_millis, now);
        let expires_at = expires_at_from(ttl_remaining, now);

        debug!(key = key.as_str(), "duplicate idempotency key detected");
        Ok(CheckOutcome {
            is_new: false,
            record: IdempotencyRecord {
                composite_key: key.as_str().to_string(),
                raw_key: key.raw_key().to_string(),
                namespace: key.namespace().map(str::to_string),
                created_at,
                expires_at,
            },
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::key::compose;

    #[test]
    fn test_storage_key_is_prefixed() {
        let key = compose("order-1", Some("billing"));
        assert_eq!(storage_key(&key), "idempotency:billing:order-1");

        let plain = compose("order-1", None);
        assert_eq!(storage_key(&plain), "idempotency:order-1");
    }

    #[test]
    fn test_created_at_reconstruction() {
        let now = Utc::now();
        let stored = now - chrono::Duration::seconds(30);

        let reconstructed = created_at_from(Some(stored.timestamp_millis()), now);
        assert_eq!(reconstructed.timestamp_millis(), stored.timestamp_millis());
    }

    #[test]
    fn test_created_at_falls_back_to_now() {
        let now = Utc::now();
        assert_eq!(created_at_from(None, now), now);
    }

    #[test]
    fn test_expires_at_from_remaining_ttl() {
        let now = Utc::now();
        assert_eq!(
            expires_at_from(45, now),
            now + chrono::Duration::seconds(45)
        );
    }

    #[test]
    fn test_expires_at_falls_back_when_key_gone() {
        let now = Utc::now();
        // -2: key missing, -1: no expiry set
        assert_eq!(expires_at_from(-2, now), now);
        assert_eq!(expires_at_from(-1, now), now);
    }

    #[tokio::test]
    async fn test_connect_failure_is_backend_unavailable() {
        // Port 1 is never a Redis server; connect must fail with the
        // distinct backend failure kind, not a verdict.
        let result = RedisStore::connect("127.0.0.1", 1, Duration::from_millis(200)).await;

        match result {
            Err(IdempotencyError::BackendUnavailable(_)) => {}
            other => panic!("expected BackendUnavailable, got {:?}", other.map(|_| ())),
        }
    }
}
