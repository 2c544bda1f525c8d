//! LRU Tracker Module
//!
//! Tracks access recency for fallback-store eviction using a monotonic
//! access clock: each touch stamps the key with the next tick, eviction
//! removes the key with the lowest stamp. O(1) touch, O(n) evict — the
//! fallback store is small and bounded, evictions are rare, and touches
//! happen on every read.

use std::collections::HashMap;

// == LRU Tracker ==
/// Access-recency tracker keyed by cache key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Key → last-access stamp
    stamps: HashMap<String, u64>,
    /// Monotonic access counter
    clock: u64,
}

impl LruTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as just used.
    pub fn touch(&mut self, key: &str) {
        self.clock += 1;
        self.stamps.insert(key.to_string(), self.clock);
    }

    // == Remove ==
    /// Stops tracking a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        self.stamps.remove(key);
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key, or None when empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self
            .stamps
            .iter()
            .min_by_key(|(_, stamp)| **stamp)
            .map(|(key, _)| key.clone())?;
        self.stamps.remove(&oldest);
        Some(oldest)
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}
