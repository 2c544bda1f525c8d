//! Redis Backing Store
//!
//! `RemoteStore` implementation over a deadpool-redis connection pool.
//! Every operation is wrapped in a bounded timeout and retried a bounded
//! number of times for transient errors; a failed store never blocks or
//! panics the caller, it reports upward and the manager falls back.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ConnectionState, RemoteStore, StoreError};
use crate::config::Config;

/// Keys scanned per SCAN iteration during prefix deletion.
const SCAN_BATCH: usize = 100;

// == Redis Store ==
/// Pooled Redis client with connection state tracking.
pub struct RedisStore {
    pool: Pool,
    /// ConnectionState encoded as u8 for lock-free reads
    state: AtomicU8,
    op_timeout: Duration,
    retry_attempts: u32,
    /// Held while a reconnect attempt is in flight; concurrent attempts
    /// bail out instead of queueing
    reconnect_lock: Mutex<()>,
}

impl RedisStore {
    // == Constructor ==
    /// Creates the pool and probes the store once.
    ///
    /// A failed initial probe does not fail construction: the store starts
    /// in `Disconnected` state and the background reconnect task brings it
    /// up later. Only an unusable pool configuration is an error.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let mut pool_config = deadpool_redis::Config::from_url(&config.redis_url);
        // from_url leaves `pool` unset; the settings must be installed, not
        // patched in place, or they never apply
        let mut pool_settings = deadpool_redis::PoolConfig::new(config.pool_size);
        pool_settings.timeouts.wait = Some(Duration::from_millis(config.op_timeout_ms));
        pool_settings.timeouts.create = Some(Duration::from_millis(config.op_timeout_ms));
        pool_settings.timeouts.recycle = Some(Duration::from_millis(config.op_timeout_ms));
        pool_config.pool = Some(pool_settings);

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Unavailable(format!("pool creation failed: {}", e)))?;

        let store = Self {
            pool,
            state: AtomicU8::new(ConnectionState::Disconnected.as_u8()),
            op_timeout: Duration::from_millis(config.op_timeout_ms),
            retry_attempts: config.retry_attempts,
            reconnect_lock: Mutex::new(()),
        };

        match store.ping().await {
            Ok(()) => info!(url = %config.masked_redis_url(), "Connected to backing store"),
            Err(e) => warn!(
                url = %config.masked_redis_url(),
                error = %e,
                "Backing store unreachable at startup, continuing in fallback-only mode"
            ),
        }

        Ok(store)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }

    /// Marks the outcome of an operation on the connection state.
    fn record_outcome(&self, ok: bool) {
        if ok {
            self.set_state(ConnectionState::Connected);
        } else if self.state() == ConnectionState::Connected {
            self.set_state(ConnectionState::Degraded);
        }
    }

    /// Runs `op` against a pooled connection with the bounded timeout,
    /// retrying transient failures up to `retry_attempts` extra times.
    async fn with_retries<T, F, Fut>(&self, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut(deadpool_redis::Connection) -> Fut,
        Fut: std::future::Future<Output = Result<T, redis::RedisError>>,
    {
        let mut last_err = StoreError::Unavailable("no attempt made".to_string());

        for attempt in 0..=self.retry_attempts {
            let conn = match tokio::time::timeout(self.op_timeout, self.pool.get()).await {
                Ok(Ok(conn)) => conn,
                Ok(Err(e)) => {
                    last_err = StoreError::Unavailable(e.to_string());
                    continue;
                }
                Err(_) => {
                    last_err = StoreError::Timeout(self.op_timeout.as_millis() as u64);
                    continue;
                }
            };

            match tokio::time::timeout(self.op_timeout, op(conn)).await {
                Ok(Ok(value)) => {
                    self.record_outcome(true);
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    debug!(attempt, error = %e, "Backing store operation failed");
                    last_err = StoreError::Io(e.to_string());
                }
                Err(_) => {
                    debug!(attempt, timeout_ms = self.op_timeout.as_millis() as u64,
                        "Backing store operation timed out");
                    last_err = StoreError::Timeout(self.op_timeout.as_millis() as u64);
                }
            }
        }

        self.record_outcome(false);
        Err(last_err)
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.with_retries(|mut conn| {
            let key = key.to_string();
            async move { conn.get::<_, Option<Vec<u8>>>(&key).await }
        })
        .await
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        self.with_retries(|mut conn| {
            let key = key.to_string();
            let value = value.to_vec();
            async move { conn.set_ex::<_, _, ()>(&key, value, ttl_seconds).await }
        })
        .await
    }

    async fn delete_raw(&self, key: &str) -> Result<bool, StoreError> {
        let removed = self
            .with_retries(|mut conn| {
                let key = key.to_string();
                async move { conn.del::<_, usize>(&key).await }
            })
            .await?;
        Ok(removed > 0)
    }

    async fn exists_raw(&self, key: &str) -> Result<bool, StoreError> {
        self.with_retries(|mut conn| {
            let key = key.to_string();
            async move { conn.exists::<_, bool>(&key).await }
        })
        .await
    }

    /// Cursor-based SCAN + DEL. KEYS is never used; it blocks the store on
    /// large keyspaces.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let pattern = format!("{}*", prefix);
        self.with_retries(|mut conn| {
            let pattern = pattern.clone();
            async move {
                let mut removed = 0usize;
                let mut cursor: u64 = 0;
                loop {
                    let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn)
                        .await?;

                    if !keys.is_empty() {
                        removed += conn.del::<_, usize>(&keys).await?;
                    }

                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                Ok(removed)
            }
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        // A ping is its own probe; no retries, one bounded round trip.
        let result = match tokio::time::timeout(self.op_timeout, self.pool.get()).await {
            Ok(Ok(mut conn)) => {
                match tokio::time::timeout(
                    self.op_timeout,
                    redis::cmd("PING").query_async::<()>(&mut conn),
                )
                .await
                {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(StoreError::Io(e.to_string())),
                    Err(_) => Err(StoreError::Timeout(self.op_timeout.as_millis() as u64)),
                }
            }
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.op_timeout.as_millis() as u64)),
        };

        match &result {
            Ok(()) => self.set_state(ConnectionState::Connected),
            Err(_) => {
                if self.state() == ConnectionState::Connected {
                    self.set_state(ConnectionState::Degraded);
                } else {
                    self.set_state(ConnectionState::Disconnected);
                }
            }
        }
        result
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Relaxed))
    }

    async fn try_reconnect(&self) -> bool {
        // Only one reconnect in flight; later callers observe the state
        // the winner leaves behind.
        let Ok(_guard) = self.reconnect_lock.try_lock() else {
            return self.state() == ConnectionState::Connected;
        };

        self.set_state(ConnectionState::Connecting);
        match self.ping().await {
            Ok(()) => {
                info!("Backing store connection re-established");
                true
            }
            Err(e) => {
                debug!(error = %e, "Reconnect attempt failed");
                false
            }
        }
    }
}
