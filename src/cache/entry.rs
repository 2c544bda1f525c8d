//! Cache Entry Module
//!
//! The unit stored by the fallback store: encoded payload, format tag and
//! absolute expiry timestamp.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::serialize::PayloadFormat;

// == Cache Entry ==
/// A single fallback-store entry.
///
/// The backing store expires entries natively, so only the fallback store
/// carries the expiry timestamp and checks it lazily on read.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Encoded payload bytes
    pub payload: Vec<u8>,
    /// Format the payload was encoded with
    pub format: PayloadFormat,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry expiring `ttl_seconds` from now.
    pub fn new(payload: Vec<u8>, format: PayloadFormat, ttl_seconds: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            payload,
            format,
            created_at: now,
            // An absurdly large TTL saturates to "never expires" instead
            // of wrapping into the past
            expires_at: now.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiry
    /// timestamp; the full TTL elapsing makes it immediately invisible.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    /// Remaining lifetime in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
