//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::error::Result;
use crate::strategy::CacheType;

/// Request body for POST /admin/cache/clear
///
/// # Fields
/// - `cache_type`: Optional cache type name; omitted means clear everything
///   under the manager's namespace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearRequest {
    /// Cache type to clear, by its string name
    #[serde(default)]
    pub cache_type: Option<String>,
}

impl ClearRequest {
    /// Resolves the string form to a `CacheType`. Unknown names are a
    /// configuration error (400), never silently defaulted.
    pub fn resolve(&self) -> Result<Option<CacheType>> {
        self.cache_type
            .as_deref()
            .map(str::parse)
            .transpose()
    }
}
