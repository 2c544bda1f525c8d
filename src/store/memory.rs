//! In-Memory Remote Store
//!
//! `RemoteStore` double backed by a process-local map. Used by tests as
//! the substitution seam (including failure injection to exercise the
//! fallback path) and by fallback-only deployments where the backing
//! store is disabled outright.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ConnectionState, RemoteStore, StoreError};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Memory Store ==
/// Map of key → (bytes, absolute expiry). Expiry is enforced at read time,
/// mirroring a real store's native TTL handling. Connection state follows
/// operation outcomes the way the pooled adapter's does.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (Vec<u8>, u64)>>,
    /// When set, every operation reports `Unavailable`
    failing: AtomicBool,
    state: AtomicU8,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
            state: AtomicU8::new(ConnectionState::Connected.as_u8()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the backing store going down or coming back. State only
    /// changes once an operation or probe observes the outage.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::Relaxed) {
            if self.state() == ConnectionState::Connected {
                self.set_state(ConnectionState::Degraded);
            } else {
                self.set_state(ConnectionState::Disconnected);
            }
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            self.set_state(ConnectionState::Connected);
            Ok(())
        }
    }

    /// Number of live entries, for test assertions.
    pub async fn len(&self) -> usize {
        let now = now_ms();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| *expires > now)
            .count()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((bytes, expires)) if *expires > now_ms() => Ok(Some(bytes.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let expires = now_ms().saturating_add(ttl_seconds.saturating_mul(1000));
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_vec(), expires));
        Ok(())
    }

    async fn delete_raw(&self, key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn exists_raw(&self, key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let entries = self.entries.read().await;
        Ok(matches!(entries.get(key), Some((_, expires)) if *expires > now_ms()))
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Relaxed))
    }

    async fn try_reconnect(&self) -> bool {
        self.set_state(ConnectionState::Connecting);
        self.ping().await.is_ok()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_delete() {
        let store = MemoryStore::new();

        store.set_raw("k1", b"v1", 60).await.unwrap();
        assert_eq!(store.get_raw("k1").await.unwrap(), Some(b"v1".to_vec()));
        assert!(store.exists_raw("k1").await.unwrap());

        assert!(store.delete_raw("k1").await.unwrap());
        assert!(!store.delete_raw("k1").await.unwrap());
        assert_eq!(store.get_raw("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_native_expiry() {
        let store = MemoryStore::new();
        store.set_raw("short", b"v", 1).await.unwrap();

        assert!(store.get_raw("short").await.unwrap().is_some());
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        assert!(store.get_raw("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_huge_ttl_does_not_wrap() {
        let store = MemoryStore::new();
        store.set_raw("forever", b"v", u64::MAX).await.unwrap();

        // A wrapped expiry would make the entry invisible immediately
        assert!(store.exists_raw("forever").await.unwrap());
        assert_eq!(store.get_raw("forever").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_memory_store_delete_prefix() {
        let store = MemoryStore::new();
        store.set_raw("app:user:1", b"a", 60).await.unwrap();
        store.set_raw("app:user:2", b"b", 60).await.unwrap();
        store.set_raw("app:session:1", b"c", 60).await.unwrap();

        let removed = store.delete_prefix("app:user:").await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.exists_raw("app:session:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        store.set_failing(true);

        assert!(matches!(
            store.get_raw("k").await,
            Err(StoreError::Unavailable(_))
        ));
        // First failure from Connected degrades, further failures disconnect
        assert_eq!(store.state(), ConnectionState::Degraded);
        assert!(store.ping().await.is_err());
        assert_eq!(store.state(), ConnectionState::Disconnected);

        store.set_failing(false);
        assert!(store.try_reconnect().await);
        assert_eq!(store.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_memory_store_state_flips_on_observation_only() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let _ = store.ping().await;
        let _ = store.ping().await;
        assert_eq!(store.state(), ConnectionState::Disconnected);

        // Recovery is only visible once something probes
        store.set_failing(false);
        assert_eq!(store.state(), ConnectionState::Disconnected);
        store.ping().await.unwrap();
        assert_eq!(store.state(), ConnectionState::Connected);
    }
}
