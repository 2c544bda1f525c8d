//! Fallback Store Module
//!
//! Bounded in-process map used when the backing store is unreachable.
//! Keyed by the fully-prefixed key; expiry is checked lazily on read and
//! the least recently used entry is evicted at capacity.
//!
//! Process-local by design: it provides no cross-process sharing and is
//! reset on restart. Callers needing cross-instance consistency must not
//! depend on fallback semantics.

use std::collections::HashMap;

use crate::cache::{CacheEntry, LruTracker};
use crate::serialize::PayloadFormat;

// == Fallback Store ==
#[derive(Debug)]
pub struct FallbackStore {
    /// Fully-prefixed key → entry
    entries: HashMap<String, CacheEntry>,
    /// Access recency for eviction
    lru: LruTracker,
    /// Capacity bound
    max_entries: usize,
}

impl FallbackStore {
    // == Constructor ==
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Get ==
    /// Returns the payload and format for a live entry. Expired entries
    /// are removed on the spot and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<(Vec<u8>, PayloadFormat)> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.lru.remove(key);
                None
            }
            Some(entry) => {
                let result = (entry.payload.clone(), entry.format);
                self.lru.touch(key);
                Some(result)
            }
            None => None,
        }
    }

    // == Set ==
    /// Stores an entry, evicting the least recently used one at capacity.
    pub fn set(&mut self, key: &str, payload: Vec<u8>, format: PayloadFormat, ttl_seconds: u64) {
        let is_overwrite = self.entries.contains_key(key);
        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(payload, format, ttl_seconds));
        self.lru.touch(key);
    }

    // == Remove ==
    /// Removes an entry. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
        }
        removed
    }

    // == Contains ==
    /// Presence check honoring expiry, without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(entry) if !entry.is_expired())
    }

    // == Remove Prefix ==
    /// Removes every entry whose key starts with `prefix`. Returns the
    /// count removed.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &matching {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        matching.len()
    }

    // == Purge Expired ==
    /// Removes all expired entries, for the background sweep task.
    pub fn purge_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired.len()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn store() -> FallbackStore {
        FallbackStore::new(100)
    }

    #[test]
    fn test_fallback_set_and_get() {
        let mut fb = store();
        fb.set("k1", b"v1".to_vec(), PayloadFormat::Json, 60);

        let (payload, format) = fb.get("k1").unwrap();
        assert_eq!(payload, b"v1");
        assert_eq!(format, PayloadFormat::Json);
    }

    #[test]
    fn test_fallback_get_missing() {
        let mut fb = store();
        assert!(fb.get("absent").is_none());
    }

    #[test]
    fn test_fallback_lazy_expiry_on_read() {
        let mut fb = store();
        fb.set("short", b"v".to_vec(), PayloadFormat::Json, 1);

        assert!(fb.get("short").is_some());
        sleep(Duration::from_millis(1100));

        assert!(fb.get("short").is_none());
        // The expired entry was removed, not just hidden
        assert!(fb.is_empty());
    }

    #[test]
    fn test_fallback_overwrite_resets_value() {
        let mut fb = store();
        fb.set("k", b"v1".to_vec(), PayloadFormat::Json, 60);
        fb.set("k", b"v2".to_vec(), PayloadFormat::Binary, 60);

        let (payload, format) = fb.get("k").unwrap();
        assert_eq!(payload, b"v2");
        assert_eq!(format, PayloadFormat::Binary);
        assert_eq!(fb.len(), 1);
    }

    #[test]
    fn test_fallback_eviction_at_capacity() {
        let mut fb = FallbackStore::new(3);
        fb.set("a", b"1".to_vec(), PayloadFormat::Json, 60);
        fb.set("b", b"2".to_vec(), PayloadFormat::Json, 60);
        fb.set("c", b"3".to_vec(), PayloadFormat::Json, 60);

        // "a" is oldest and gets evicted
        fb.set("d", b"4".to_vec(), PayloadFormat::Json, 60);

        assert_eq!(fb.len(), 3);
        assert!(fb.get("a").is_none());
        assert!(fb.get("d").is_some());
    }

    #[test]
    fn test_fallback_read_refreshes_recency() {
        let mut fb = FallbackStore::new(3);
        fb.set("a", b"1".to_vec(), PayloadFormat::Json, 60);
        fb.set("b", b"2".to_vec(), PayloadFormat::Json, 60);
        fb.set("c", b"3".to_vec(), PayloadFormat::Json, 60);

        fb.get("a");
        fb.set("d", b"4".to_vec(), PayloadFormat::Json, 60);

        // "b" was the oldest once "a" was read
        assert!(fb.get("a").is_some());
        assert!(fb.get("b").is_none());
    }

    #[test]
    fn test_fallback_remove_prefix() {
        let mut fb = store();
        fb.set("ns:user:1", b"a".to_vec(), PayloadFormat::Json, 60);
        fb.set("ns:user:2", b"b".to_vec(), PayloadFormat::Json, 60);
        fb.set("ns:session:1", b"c".to_vec(), PayloadFormat::Json, 60);

        assert_eq!(fb.remove_prefix("ns:user:"), 2);
        assert_eq!(fb.len(), 1);
        assert!(fb.contains("ns:session:1"));
    }

    #[test]
    fn test_fallback_purge_expired() {
        let mut fb = store();
        fb.set("short", b"a".to_vec(), PayloadFormat::Json, 1);
        fb.set("long", b"b".to_vec(), PayloadFormat::Json, 60);

        sleep(Duration::from_millis(1100));

        assert_eq!(fb.purge_expired(), 1);
        assert_eq!(fb.len(), 1);
        assert!(fb.contains("long"));
    }

    #[test]
    fn test_fallback_remove() {
        let mut fb = store();
        fb.set("k", b"v".to_vec(), PayloadFormat::Json, 60);

        assert!(fb.remove("k"));
        assert!(!fb.remove("k"));
    }
}
