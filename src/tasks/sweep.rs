//! Expiry Sweep Task
//!
//! Background task that periodically removes expired idempotency
//! records from the in-process store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::InMemoryStore;

/// Spawns a background task that periodically sweeps expired records.
///
/// The sweep exists for memory reclamation only: duplicate detection
/// is correct whether or not it has ever run, because the check path
/// compares expiry itself. Each removal uses remove-if-matches, so a
/// record superseded while the sweep runs is never touched. The shared
/// backend needs no sweep; Redis expires keys natively.
///
/// # Arguments
/// * `store` - Shared reference to the in-process store
/// * `sweep_interval_secs` - Interval in seconds between sweep runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the
/// task during graceful shutdown.
pub fn spawn_sweep_task(store: Arc<InMemoryStore>, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let removed = store.sweep_expired();

            // Log sweep statistics
            if removed > 0 {
                info!("Expiry sweep: removed {} expired records", removed);
            } else {
                debug!("Expiry sweep: no expired records found");
            }
        }
    })
}
