//! Backing Store Module
//!
//! Owns the connection to the remote key/value store. `RemoteStore` is the
//! seam between the cache manager and any concrete store: `RedisStore` in
//! production, `MemoryStore` in tests and fallback-only deployments.

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use redis::RedisStore;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

// == Connection State ==
/// Lifecycle state of the backing store connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection established
    Disconnected,
    /// Connection attempt in progress
    Connecting,
    /// Healthy, serving traffic
    Connected,
    /// Connected at some point but recent operations failed
    Degraded,
}

impl ConnectionState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Degraded,
            _ => ConnectionState::Disconnected,
        }
    }
}

// == Store Error ==
/// Store-level failures. These are infrastructure problems: the manager
/// absorbs them by routing to the fallback store and they never reach the
/// cache caller.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store unreachable or connection pool exhausted
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    /// Operation exceeded its bounded timeout
    #[error("Backing store timeout after {0}ms")]
    Timeout(u64),

    /// Protocol or I/O error from the client library
    #[error("Backing store I/O error: {0}")]
    Io(String),
}

// == Remote Store Trait ==
/// Raw byte-level operations against the backing store.
///
/// Every method carries a bounded timeout internally; no call blocks the
/// caller indefinitely. Keys are fully composed (namespace + prefix +
/// logical key) before they reach this layer.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the raw bytes stored under a key.
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores raw bytes with a TTL; the store expires the entry natively.
    async fn set_raw(&self, key: &str, value: &[u8], ttl_seconds: u64)
        -> Result<(), StoreError>;

    /// Removes a key. Returns whether anything was removed.
    async fn delete_raw(&self, key: &str) -> Result<bool, StoreError>;

    /// Checks key presence without fetching the value.
    async fn exists_raw(&self, key: &str) -> Result<bool, StoreError>;

    /// Removes every key under a prefix. Returns the number removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError>;

    /// Round-trip liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Attempts to re-establish the connection. Returns whether the store
    /// is reachable afterwards. At most one reconnect runs at a time;
    /// concurrent calls return immediately.
    async fn try_reconnect(&self) -> bool;
}
