//! In-Process Store Module
//!
//! Idempotency store backed by a lock-free concurrent map. Claims are
//! resolved with three atomic primitives: insert-if-absent,
//! compare-and-replace, and remove-if-matches-current-value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::Result;
use crate::store::key::ComposedKey;
use crate::store::record::IdempotencyRecord;
use crate::store::{CheckOutcome, IdempotencyStore};

// == In-Memory Store ==
/// In-process idempotency store.
///
/// `DashMap` shards the key space, so a claim for one key never blocks
/// a claim for a key in a different shard, and no lock is held beyond
/// the individual atomic map operations. Records are removed only by
/// [`sweep_expired`](Self::sweep_expired); the check path supersedes
/// expired records in place but never deletes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Composite key to record map
    entries: DashMap<String, IdempotencyRecord>,
}

impl InMemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Check And Insert ==
    /// Claims `key` for `ttl_seconds` as of `now`, or reports the
    /// existing live claim.
    ///
    /// `now` is passed explicitly so expiry scenarios can be tested
    /// without sleeping; the trait implementation supplies the wall
    /// clock.
    ///
    /// Exactly one of N concurrent callers on a still-live key observes
    /// `is_new = true`. The sequence is:
    /// 1. insert-if-absent - a vacant slot means this call wins.
    /// 2. A live existing record means this call is a duplicate and
    ///    reports the winner's record.
    /// 3. An expired existing record is superseded by
    ///    compare-and-replace against the exact record observed in
    ///    step 1. Under the shard lock, a failed compare and the
    ///    follow-up read are one atomic step, so the loser reports the
    ///    now-current record without retrying.
    pub fn check_and_insert_at(
        &self,
        key: &ComposedKey,
        ttl_seconds: u64,
        now: DateTime<Utc>,
    ) -> CheckOutcome {
        let candidate = IdempotencyRecord::new(key, now, ttl_seconds);

        // Insert-if-absent
        let existing = match self.entries.entry(candidate.composite_key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate.clone());
                return CheckOutcome {
                    is_new: true,
                    record: candidate,
                };
            }
            Entry::Occupied(slot) => slot.get().clone(),
        };

        // Still live: duplicate, reported with the winner's timestamps
        if !existing.is_expired_at(now) {
            return CheckOutcome {
                is_new: false,
                record: existing,
            };
        }

        // Expired: compare-and-replace against the observed record
        match self.entries.entry(candidate.composite_key.clone()) {
            Entry::Vacant(slot) => {
                // The sweep removed the expired record in between;
                // claiming the vacated slot wins the race all the same.
                slot.insert(candidate.clone());
                CheckOutcome {
                    is_new: true,
                    record: candidate,
                }
            }
            Entry::Occupied(mut slot) => {
                if *slot.get() == existing {
                    slot.insert(candidate.clone());
                    CheckOutcome {
                        is_new: true,
                        record: candidate,
                    }
                } else {
                    // A concurrent replacer won; its record is the live
                    // claim now.
                    CheckOutcome {
                        is_new: false,
                        record: slot.get().clone(),
                    }
                }
            }
        }
    }

    // == Sweep Expired ==
    /// Removes every record whose expiry is before the sweep time.
    ///
    /// Each removal is guarded by remove-if-matches: an entry is
    /// dropped only while it still holds the exact record that was
    /// observed as expired, so a record superseded mid-sweep survives.
    /// The sweep reclaims memory only; duplicate detection never
    /// depends on it having run.
    ///
    /// Returns the number of records removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();

        let expired: Vec<(String, IdempotencyRecord)> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut removed = 0;
        for (key, observed) in expired {
            if self
                .entries
                .remove_if(&key, |_, current| *current == observed)
                .is_some()
            {
                removed += 1;
            }
        }

        removed
    }

    // == Length ==
    /// Returns the current number of records, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryStore {
    async fn check_and_insert(&self, key: &ComposedKey, ttl_seconds: u64) -> Result<CheckOutcome> {
        // The in-process path cannot fail: the map operations are
        // infallible and there is no transport to become unavailable.
        Ok(self.check_and_insert_at(key, ttl_seconds, Utc::now()))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::key::compose;
    use chrono::Duration;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_insert_is_new() {
        let store = InMemoryStore::new();
        let key = compose("order-1", None);

        let outcome = store.check_and_insert_at(&key, 60, Utc::now());

        assert!(outcome.is_new);
        assert_eq!(outcome.record.raw_key, "order-1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_second_call_is_duplicate_with_winner_timestamps() {
        let store = InMemoryStore::new();
        let key = compose("order-1", None);
        let t0 = Utc::now();

        let first = store.check_and_insert_at(&key, 60, t0);
        let second = store.check_and_insert_at(&key, 120, t0 + Duration::seconds(5));

        assert!(first.is_new);
        assert!(!second.is_new);
        // The duplicate sees the winner's record; its own requested TTL
        // is never applied.
        assert_eq!(second.record, first.record);
        assert_eq!(second.record.created_at, t0);
    }

    #[test]
    fn test_distinct_keys_never_interfere() {
        let store = InMemoryStore::new();
        let now = Utc::now();

        let first = store.check_and_insert_at(&compose("k1", None), 60, now);
        let second = store.check_and_insert_at(&compose("k2", None), 60, now);

        assert!(first.is_new);
        assert!(second.is_new);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_namespaced_and_plain_keys_are_distinct() {
        let store = InMemoryStore::new();
        let now = Utc::now();

        assert!(store.check_and_insert_at(&compose("X", None), 60, now).is_new);
        assert!(store.check_and_insert_at(&compose("X", Some("A")), 60, now).is_new);
        // Empty namespace collides with the unnamespaced claim
        assert!(!store.check_and_insert_at(&compose("X", Some("")), 60, now).is_new);
    }

    #[test]
    fn test_expired_key_is_reclaimed() {
        let store = InMemoryStore::new();
        let key = compose("order-1", None);
        let t0 = Utc::now();

        let first = store.check_and_insert_at(&key, 1, t0);
        assert!(first.is_new);

        let rebirth = store.check_and_insert_at(&key, 1, t0 + Duration::milliseconds(1200));
        assert!(rebirth.is_new);
        assert_ne!(rebirth.record.created_at, first.record.created_at);
        // Superseding replaces in place; nothing was deleted
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_exact_expiry_instant_still_blocks() {
        let store = InMemoryStore::new();
        let key = compose("order-1", None);
        let t0 = Utc::now();

        let first = store.check_and_insert_at(&key, 1, t0);
        let at_expiry = store.check_and_insert_at(&key, 1, first.record.expires_at);

        assert!(!at_expiry.is_new);
    }

    #[test]
    fn test_replay_scenario() {
        // CheckAndInsert("order-1", ttl=1s) at t=0, t=0.5s, t=1.2s
        let store = InMemoryStore::new();
        let key = compose("order-1", None);
        let t0 = Utc::now();

        let first = store.check_and_insert_at(&key, 1, t0);
        assert!(first.is_new);

        let replay = store.check_and_insert_at(&key, 1, t0 + Duration::milliseconds(500));
        assert!(!replay.is_new);
        assert_eq!(replay.record.created_at, t0);

        let after_expiry = store.check_and_insert_at(&key, 1, t0 + Duration::milliseconds(1200));
        assert!(after_expiry.is_new);
        assert_eq!(after_expiry.record.created_at, t0 + Duration::milliseconds(1200));
    }

    #[test]
    fn test_concurrent_callers_exactly_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let key = compose("contested", None);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                thread::spawn(move || store.check_and_insert_at(&key, 60, Utc::now()))
            })
            .collect();

        let outcomes: Vec<CheckOutcome> = handles
            .into_iter()
            .map(|h| h.join().expect("caller thread panicked"))
            .collect();

        let winners: Vec<_> = outcomes.iter().filter(|o| o.is_new).collect();
        assert_eq!(winners.len(), 1, "exactly one caller must win");

        // Every loser observes the winner's record
        let winning_record = &winners[0].record;
        for outcome in outcomes.iter().filter(|o| !o.is_new) {
            assert_eq!(&outcome.record, winning_record);
        }
    }

    #[test]
    fn test_concurrent_replacers_on_expired_key_single_winner() {
        let store = Arc::new(InMemoryStore::new());
        let key = compose("reborn", None);

        // Seed an already-expired claim
        let past = Utc::now() - Duration::seconds(10);
        assert!(store.check_and_insert_at(&key, 1, past).is_new);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                thread::spawn(move || store.check_and_insert_at(&key, 60, Utc::now()))
            })
            .collect();

        let outcomes: Vec<CheckOutcome> = handles
            .into_iter()
            .map(|h| h.join().expect("caller thread panicked"))
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.is_new).count(), 1);
        // The reclaimed record is live, not the expired seed
        for outcome in &outcomes {
            assert!(outcome.record.created_at > past);
        }
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let store = InMemoryStore::new();
        let past = Utc::now() - Duration::seconds(10);

        store.check_and_insert_at(&compose("expired-1", None), 1, past);
        store.check_and_insert_at(&compose("expired-2", None), 1, past);
        store.check_and_insert_at(&compose("live", None), 3600, Utc::now());

        let removed = store.sweep_expired();

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        // The live claim still blocks
        assert!(!store
            .check_and_insert_at(&compose("live", None), 3600, Utc::now())
            .is_new);
    }

    #[test]
    fn test_sweep_on_empty_store() {
        let store = InMemoryStore::new();
        assert_eq!(store.sweep_expired(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_swept_key_can_be_claimed_again() {
        let store = InMemoryStore::new();
        let key = compose("order-1", None);
        let past = Utc::now() - Duration::seconds(10);

        store.check_and_insert_at(&key, 1, past);
        store.sweep_expired();

        assert!(store.is_empty());
        assert!(store.check_and_insert_at(&key, 60, Utc::now()).is_new);
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let store: Arc<dyn IdempotencyStore> = Arc::new(InMemoryStore::new());
        let key = compose("order-1", Some("billing"));

        let first = store.check_and_insert(&key, 60).await.unwrap();
        let second = store.check_and_insert(&key, 60).await.unwrap();

        assert!(first.is_new);
        assert!(!second.is_new);
        assert_eq!(second.record.created_at, first.record.created_at);
    }
}
