//! Cache Manager Module
//!
//! The façade over the backing store and the in-process fallback store.
//! Routes every operation to the backing store first and transparently
//! falls back on infrastructure failure; resolves TTL and key prefix from
//! the strategy registry; records statistics; exposes the health probe
//! and the memoization helper.
//!
//! Failure semantics: backing-store trouble is never the caller's problem.
//! It degrades service (process-local fallback, smaller capacity, no
//! cross-process sharing) and shows up in `health_check`, nothing more.
//! Serialization and invalid-TTL errors do surface, since they indicate
//! programmer error.
//!
//! Known limitation: a value written to the fallback store while the
//! backing store is down is not replayed after recovery, so readers of the
//! recovered store can observe stale or missing data. Accepted trade-off;
//! no reconciliation is attempted.

use std::future::Future;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::fallback::FallbackStore;
use crate::cache::stats::{CacheStats, StatsSnapshot};
use crate::error::{CacheError, Result};
use crate::serialize;
use crate::store::{ConnectionState, RemoteStore};
use crate::strategy::{CacheType, StrategyRegistry};

// == Health Report ==
/// Result of a `health_check` call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    /// Backing store answered the probe
    pub connected: bool,
    /// Probe round-trip time in milliseconds
    pub latency_ms: f64,
    /// Global hits / (hits + misses)
    pub hit_rate: f64,
    /// The last routed operation was served by the fallback store
    pub using_fallback: bool,
    /// Adapter connection state
    pub state: ConnectionState,
}

/// Cached probe outcome, shared by concurrent health-check callers.
#[derive(Debug, Clone, Copy)]
struct ProbeResult {
    at: Instant,
    connected: bool,
    latency_ms: f64,
}

// == Cache Manager ==
pub struct CacheManager {
    registry: StrategyRegistry,
    namespace: String,
    /// None in fallback-only deployments
    remote: Option<Arc<dyn RemoteStore>>,
    fallback: RwLock<FallbackStore>,
    stats: CacheStats,
    using_fallback: AtomicBool,
    /// Debounce slot: one probe in flight, result reused within the window
    probe: Mutex<Option<ProbeResult>>,
    probe_timeout: Duration,
}

impl CacheManager {
    // == Constructor ==
    /// A `None` remote yields a usable fallback-only manager; a dead
    /// backing store at startup must never prevent the process from
    /// serving.
    pub fn new(
        registry: StrategyRegistry,
        namespace: String,
        remote: Option<Arc<dyn RemoteStore>>,
        fallback_max_entries: usize,
        probe_timeout: Duration,
    ) -> Self {
        let fallback_only = remote.is_none();
        Self {
            registry,
            namespace,
            remote,
            fallback: RwLock::new(FallbackStore::new(fallback_max_entries)),
            stats: CacheStats::new(),
            using_fallback: AtomicBool::new(fallback_only),
            probe: Mutex::new(None),
            probe_timeout,
        }
    }

    // == Key Composition ==
    /// namespace + type prefix + logical key.
    fn compose_key(&self, key: &str, cache_type: CacheType) -> String {
        format!(
            "{}{}{}",
            self.namespace,
            self.registry.strategy(cache_type).prefix,
            key
        )
    }

    /// Registry TTL unless overridden. A zero override is a contract
    /// violation, reported immediately rather than silently defaulted.
    fn resolve_ttl(&self, cache_type: CacheType, ttl_override: Option<u64>) -> Result<u64> {
        match ttl_override {
            Some(0) => Err(CacheError::InvalidTtl(
                "TTL override must be a positive number of seconds".to_string(),
            )),
            Some(ttl) => Ok(ttl),
            None => Ok(self.registry.strategy(cache_type).ttl_seconds),
        }
    }

    fn set_using_fallback(&self, v: bool) {
        // A disabled backing store keeps the flag pinned on
        self.using_fallback
            .store(v || self.remote.is_none(), Ordering::Relaxed);
    }

    // == Get ==
    /// Reads a value. Backing store first; on adapter failure the fallback
    /// store is tried. A corrupted payload is treated as a miss and the
    /// offending entry deleted.
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        cache_type: CacheType,
    ) -> Result<Option<T>> {
        let full_key = self.compose_key(key, cache_type);

        if let Some(remote) = &self.remote {
            match remote.get_raw(&full_key).await {
                Ok(Some(buf)) => {
                    self.set_using_fallback(false);
                    let decoded = serialize::unframe(&buf)
                        .and_then(|(payload, format)| serialize::decode::<T>(payload, format));
                    return match decoded {
                        Ok(value) => {
                            self.stats.record_hit(cache_type);
                            Ok(Some(value))
                        }
                        Err(e) => {
                            warn!(key = %full_key, error = %e,
                                "Corrupted cache entry, deleting");
                            let _ = remote.delete_raw(&full_key).await;
                            self.stats.record_miss(cache_type);
                            Ok(None)
                        }
                    };
                }
                Ok(None) => {
                    self.set_using_fallback(false);
                    self.stats.record_miss(cache_type);
                    return Ok(None);
                }
                Err(e) => {
                    debug!(key = %full_key, error = %e,
                        "Backing store read failed, trying fallback");
                    self.stats.record_error(cache_type);
                    self.set_using_fallback(true);
                }
            }
        }

        let entry = self.fallback.write().await.get(&full_key);
        match entry {
            Some((payload, format)) => match serialize::decode::<T>(&payload, format) {
                Ok(value) => {
                    self.stats.record_hit(cache_type);
                    Ok(Some(value))
                }
                Err(e) => {
                    warn!(key = %full_key, error = %e,
                        "Corrupted fallback entry, deleting");
                    self.fallback.write().await.remove(&full_key);
                    self.stats.record_miss(cache_type);
                    Ok(None)
                }
            },
            None => {
                self.stats.record_miss(cache_type);
                Ok(None)
            }
        }
    }

    // == Set ==
    /// Writes a value to the backing store, or to the fallback store when
    /// the adapter fails — never both, so a recovered backing store cannot
    /// later serve a duplicate going stale. Only serialization and TTL
    /// contract violations fail the call.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        cache_type: CacheType,
        ttl_override: Option<u64>,
    ) -> Result<()> {
        let ttl = self.resolve_ttl(cache_type, ttl_override)?;
        let (bytes, format) = serialize::encode(value)?;
        let full_key = self.compose_key(key, cache_type);

        if let Some(remote) = &self.remote {
            let framed = serialize::frame(&bytes, format);
            match remote.set_raw(&full_key, &framed, ttl).await {
                Ok(()) => {
                    self.set_using_fallback(false);
                    self.stats.record_set(cache_type);
                    return Ok(());
                }
                Err(e) => {
                    debug!(key = %full_key, error = %e,
                        "Backing store write failed, using fallback");
                    self.stats.record_error(cache_type);
                    self.set_using_fallback(true);
                }
            }
        }

        self.fallback
            .write()
            .await
            .set(&full_key, bytes, format, ttl);
        self.stats.record_set(cache_type);
        Ok(())
    }

    // == Delete ==
    /// Removes a key from whichever store holds it. Deleting an absent key
    /// is not an error; returns whether anything was removed.
    pub async fn delete(&self, key: &str, cache_type: CacheType) -> Result<bool> {
        let full_key = self.compose_key(key, cache_type);

        let mut removed = self.fallback.write().await.remove(&full_key);

        if let Some(remote) = &self.remote {
            match remote.delete_raw(&full_key).await {
                Ok(r) => {
                    self.set_using_fallback(false);
                    removed |= r;
                }
                Err(e) => {
                    debug!(key = %full_key, error = %e, "Backing store delete failed");
                    self.stats.record_error(cache_type);
                    self.set_using_fallback(true);
                }
            }
        }

        if removed {
            self.stats.record_delete(cache_type);
        }
        Ok(removed)
    }

    // == Exists ==
    /// Presence check. Does not move the hit/miss counters.
    pub async fn exists(&self, key: &str, cache_type: CacheType) -> bool {
        let full_key = self.compose_key(key, cache_type);

        if let Some(remote) = &self.remote {
            if let Ok(true) = remote.exists_raw(&full_key).await {
                return true;
            }
        }

        self.fallback.read().await.contains(&full_key)
    }

    // == Clear ==
    /// Removes entries under one type's prefix, or the whole namespace.
    /// Keys outside the manager's namespace are never touched even when
    /// they share the backing store.
    pub async fn clear(&self, cache_type: Option<CacheType>) -> Result<usize> {
        let prefix = match cache_type {
            Some(t) => format!("{}{}", self.namespace, self.registry.strategy(t).prefix),
            None => self.namespace.clone(),
        };

        let mut removed = self.fallback.write().await.remove_prefix(&prefix);

        if let Some(remote) = &self.remote {
            match remote.delete_prefix(&prefix).await {
                Ok(n) => removed += n,
                Err(e) => {
                    debug!(prefix = %prefix, error = %e, "Backing store clear failed");
                    match cache_type {
                        Some(t) => self.stats.record_error(t),
                        None => self.stats.record_error_untyped(),
                    }
                    self.set_using_fallback(true);
                }
            }
        }

        Ok(removed)
    }

    // == Health Check ==
    /// Bounded-timeout probe against the backing store. Debounced: one
    /// in-flight probe, its result shared with concurrent callers and
    /// reused until the window elapses.
    pub async fn health_check(&self) -> HealthReport {
        let probe = {
            let mut slot = self.probe.lock().await;
            match *slot {
                Some(p) if p.at.elapsed() < self.probe_timeout => p,
                _ => {
                    let fresh = self.run_probe().await;
                    *slot = Some(fresh);
                    fresh
                }
            }
        };

        HealthReport {
            connected: probe.connected,
            latency_ms: probe.latency_ms,
            hit_rate: self.stats.hit_rate(),
            using_fallback: self.using_fallback.load(Ordering::Relaxed),
            state: self.connection_state(),
        }
    }

    async fn run_probe(&self) -> ProbeResult {
        match &self.remote {
            Some(remote) => {
                let start = Instant::now();
                let connected = tokio::time::timeout(self.probe_timeout, remote.ping())
                    .await
                    .map(|r| r.is_ok())
                    .unwrap_or(false);
                ProbeResult {
                    at: Instant::now(),
                    connected,
                    latency_ms: start.elapsed().as_secs_f64() * 1000.0,
                }
            }
            None => ProbeResult {
                at: Instant::now(),
                connected: false,
                latency_ms: 0.0,
            },
        }
    }

    // == Memoization ==
    /// Runs `compute` at most once per argument set within the TTL window.
    ///
    /// The cache key is a stable content hash of the function name and the
    /// canonically serialized arguments, so it holds across processes and
    /// restarts. Compute errors propagate unchanged and are never cached.
    /// Caching trouble (unhashable args, storage failure) degrades to
    /// always computing, logged but invisible to the caller.
    pub async fn cached<A, T, E, F, Fut>(
        &self,
        func_name: &str,
        args: &A,
        cache_type: CacheType,
        ttl: Option<NonZeroU64>,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let key = match memo_key(func_name, args) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(func = func_name, error = %e,
                    "Arguments not serializable, memoization disabled for this call");
                None
            }
        };

        if let Some(key) = &key {
            if let Ok(Some(value)) = self.get::<T>(key, cache_type).await {
                return Ok(value);
            }
        }

        let value = compute().await?;

        if let Some(key) = &key {
            if let Err(e) = self
                .set(key, &value, cache_type, ttl.map(NonZeroU64::get))
                .await
            {
                warn!(func = func_name, error = %e, "Memoized result not cached");
            }
        }

        Ok(value)
    }

    // == Warm Up ==
    /// Bulk preload. Returns how many entries were stored.
    pub async fn warm_up<T: Serialize>(
        &self,
        entries: &[(String, T)],
        cache_type: CacheType,
    ) -> usize {
        let mut stored = 0;
        for (key, value) in entries {
            if self.set(key, value, cache_type, None).await.is_ok() {
                stored += 1;
            }
        }
        stored
    }

    // == Maintenance ==
    /// Removes expired fallback entries; called by the background sweep.
    pub async fn purge_expired(&self) -> usize {
        self.fallback.write().await.purge_expired()
    }

    // == Introspection ==
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Operator action: zero all counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.remote
            .as_ref()
            .map(|r| r.state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) async fn fallback_len(&self) -> usize {
        self.fallback.read().await.len()
    }
}

// == Memoization Key ==
/// SHA-256 over (function name, canonically ordered argument JSON).
///
/// Serializing through `serde_json::Value` sorts map keys, so two argument
/// sets that differ only in field ordering hash identically.
fn memo_key<A: Serialize + ?Sized>(func_name: &str, args: &A) -> Result<String> {
    let canonical = serde_json::to_value(args)
        .and_then(|v| serde_json::to_vec(&v))
        .map_err(|e| CacheError::Serialization(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(func_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(&canonical);
    Ok(format!("memo:{}:{}", func_name, hex::encode(hasher.finalize())))
}
