//! Cache Statistics Module
//!
//! Lock-free operation counters, global and per cache type. Owned by the
//! cache manager; read concurrently by health-check and admin callers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::strategy::CacheType;

// == Counter Set ==
/// One set of operation counters.
#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> CounterSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CounterSnapshot {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            hit_rate: hit_rate(hits, misses),
        }
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.sets.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Cache Stats ==
/// Global counters plus one counter set per cache type.
#[derive(Debug, Default)]
pub struct CacheStats {
    global: Counters,
    per_type: [Counters; 6],
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn typed(&self, cache_type: CacheType) -> &Counters {
        &self.per_type[cache_type as usize]
    }

    // == Recording ==
    pub fn record_hit(&self, cache_type: CacheType) {
        self.global.hits.fetch_add(1, Ordering::Relaxed);
        self.typed(cache_type).hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self, cache_type: CacheType) {
        self.global.misses.fetch_add(1, Ordering::Relaxed);
        self.typed(cache_type).misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self, cache_type: CacheType) {
        self.global.sets.fetch_add(1, Ordering::Relaxed);
        self.typed(cache_type).sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self, cache_type: CacheType) {
        self.global.deletes.fetch_add(1, Ordering::Relaxed);
        self.typed(cache_type).deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, cache_type: CacheType) {
        self.global.errors.fetch_add(1, Ordering::Relaxed);
        self.typed(cache_type).errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Error with no cache type attached (e.g. an untyped clear).
    pub fn record_error_untyped(&self) {
        self.global.errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Hit Rate ==
    /// Global hits / (hits + misses), 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        hit_rate(
            self.global.hits.load(Ordering::Relaxed),
            self.global.misses.load(Ordering::Relaxed),
        )
    }

    // == Snapshot ==
    /// Point-in-time copy of all counters for the admin surface.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            global: self.global.snapshot(),
            per_type: CacheType::ALL
                .into_iter()
                .map(|t| TypedCounterSnapshot {
                    cache_type: t.name(),
                    counters: self.typed(t).snapshot(),
                })
                .collect(),
        }
    }

    // == Reset ==
    /// Zeroes every counter. Operator action only.
    pub fn reset(&self) {
        self.global.reset();
        for counters in &self.per_type {
            counters.reset();
        }
    }
}

// == Snapshots ==
/// Copyable counter values.
#[derive(Debug, Clone, Serialize)]
pub struct CounterSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypedCounterSnapshot {
    pub cache_type: &'static str,
    #[serde(flatten)]
    pub counters: CounterSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    #[serde(flatten)]
    pub global: CounterSnapshot,
    pub per_type: Vec<TypedCounterSnapshot>,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_start_at_zero() {
        let stats = CacheStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.global.hits, 0);
        assert_eq!(snap.global.misses, 0);
        assert_eq!(snap.global.sets, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = CacheStats::new();
        stats.record_hit(CacheType::UserData);
        stats.record_hit(CacheType::UserData);
        stats.record_miss(CacheType::UserData);
        stats.record_miss(CacheType::SessionData);

        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_per_type_partitioning() {
        let stats = CacheStats::new();
        stats.record_hit(CacheType::UserData);
        stats.record_miss(CacheType::AnalysisResults);
        stats.record_set(CacheType::UserData);

        let snap = stats.snapshot();
        let user = snap
            .per_type
            .iter()
            .find(|t| t.cache_type == "user_data")
            .unwrap();
        let analysis = snap
            .per_type
            .iter()
            .find(|t| t.cache_type == "analysis_results")
            .unwrap();

        assert_eq!(user.counters.hits, 1);
        assert_eq!(user.counters.sets, 1);
        assert_eq!(user.counters.misses, 0);
        assert_eq!(analysis.counters.misses, 1);
        assert_eq!(snap.global.hits, 1);
        assert_eq!(snap.global.misses, 1);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let stats = CacheStats::new();
        stats.record_hit(CacheType::UserData);
        stats.record_error(CacheType::SessionData);

        stats.reset();
        let snap = stats.snapshot();
        assert_eq!(snap.global.hits, 0);
        assert_eq!(snap.global.errors, 0);
        assert!(snap.per_type.iter().all(|t| t.counters.hits == 0));
    }

    #[test]
    fn test_typed_hit_rate() {
        let stats = CacheStats::new();
        stats.record_hit(CacheType::ApiResponses);
        stats.record_miss(CacheType::ApiResponses);
        stats.record_miss(CacheType::ApiResponses);
        stats.record_miss(CacheType::ApiResponses);

        let snap = stats.snapshot();
        let api = snap
            .per_type
            .iter()
            .find(|t| t.cache_type == "api_responses")
            .unwrap();
        assert!((api.counters.hit_rate - 0.25).abs() < f64::EPSILON);
    }
}
