//! Fallback Expiry Sweep
//!
//! Background task that periodically removes expired fallback-store
//! entries. Reads already drop expired entries lazily; the sweep reclaims
//! memory for entries nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;

/// Spawns the periodic fallback expiry sweep.
///
/// # Arguments
/// * `manager` - Shared cache manager
/// * `interval_secs` - Seconds between sweeps
///
/// # Returns
/// A JoinHandle used to abort the task during graceful shutdown.
pub fn spawn_cleanup_task(manager: Arc<CacheManager>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "Starting fallback expiry sweep");

        loop {
            tokio::time::sleep(interval).await;

            let removed = manager.purge_expired().await;
            if removed > 0 {
                info!(removed, "Expiry sweep removed fallback entries");
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    })
}
