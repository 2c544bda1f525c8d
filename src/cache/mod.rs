//! Cache Module
//!
//! The cache manager façade plus its supporting pieces: the bounded
//! in-process fallback store with TTL expiry and LRU eviction, and the
//! operation statistics.

mod entry;
mod fallback;
mod lru;
mod manager;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use fallback::FallbackStore;
pub use lru::LruTracker;
pub use manager::{CacheManager, HealthReport};
pub use stats::{CacheStats, CounterSnapshot, StatsSnapshot, TypedCounterSnapshot};
