//! Backing Store Reconnect Loop
//!
//! Background task that probes the backing store on a fixed interval,
//! independent of request traffic, and re-establishes the connection when
//! the store comes back. The adapter itself serializes reconnects, so a
//! probe racing a request-path reconnect is harmless.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::{ConnectionState, RemoteStore};

/// Spawns the periodic reconnect/probe loop.
///
/// # Arguments
/// * `remote` - Backing store adapter
/// * `interval_secs` - Seconds between probes
pub fn spawn_reconnect_task(
    remote: Arc<dyn RemoteStore>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "Starting backing store reconnect loop");

        loop {
            tokio::time::sleep(interval).await;

            match remote.state() {
                ConnectionState::Connected => {
                    // Healthy stores still get probed so silent failures
                    // are noticed between requests
                    if remote.ping().await.is_err() {
                        debug!("Probe failed, backing store degraded");
                    }
                }
                state => {
                    debug!(?state, "Attempting backing store reconnect");
                    remote.try_reconnect().await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_reconnect_task_restores_connection() {
        let store = Arc::new(MemoryStore::new());
        store.set_failing(true);
        let _ = store.ping().await;
        let _ = store.ping().await;
        assert_eq!(store.state(), ConnectionState::Disconnected);

        let handle = spawn_reconnect_task(store.clone(), 1);

        // Store comes back; the next probe flips the state
        store.set_failing(false);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.state(), ConnectionState::Connected);
        handle.abort();
    }

    #[tokio::test]
    async fn test_reconnect_task_can_be_aborted() {
        let store = Arc::new(MemoryStore::new());
        let handle = spawn_reconnect_task(store, 1);

        handle.abort();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }
}
