//! Strategy Registry Module
//!
//! Maps each cache type to its TTL and key prefix. The set of cache types
//! is closed: a typo'd type is a compile error, not a request-time surprise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Environment;
use crate::error::{CacheError, Result};

// == Cache Type ==
/// Named category of cached data. Each variant owns one TTL and one key
/// namespace in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    UserData,
    AnalysisResults,
    MatchingResults,
    ApiResponses,
    SessionData,
    StaticContent,
}

impl CacheType {
    /// All cache types, in registry order. Index with `as usize`.
    pub const ALL: [CacheType; 6] = [
        CacheType::UserData,
        CacheType::AnalysisResults,
        CacheType::MatchingResults,
        CacheType::ApiResponses,
        CacheType::SessionData,
        CacheType::StaticContent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CacheType::UserData => "user_data",
            CacheType::AnalysisResults => "analysis_results",
            CacheType::MatchingResults => "matching_results",
            CacheType::ApiResponses => "api_responses",
            CacheType::SessionData => "session_data",
            CacheType::StaticContent => "static_content",
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CacheType {
    type Err = CacheError;

    /// Parses the string form used at the admin boundary. Unknown names
    /// are a configuration error, never silently defaulted.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user_data" => Ok(CacheType::UserData),
            "analysis_results" => Ok(CacheType::AnalysisResults),
            "matching_results" => Ok(CacheType::MatchingResults),
            "api_responses" => Ok(CacheType::ApiResponses),
            "session_data" => Ok(CacheType::SessionData),
            "static_content" => Ok(CacheType::StaticContent),
            other => Err(CacheError::Config(format!(
                "Unknown cache type: {}",
                other
            ))),
        }
    }
}

// == Strategy ==
/// TTL and key prefix pair resolved for one cache type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strategy {
    /// Effective TTL in seconds (already environment-scaled)
    pub ttl_seconds: u64,
    /// Key prefix inserted between the namespace and the logical key
    pub prefix: &'static str,
}

/// Static strategy table: (type, base TTL seconds, prefix).
const STRATEGY_TABLE: [(CacheType, u64, &str); 6] = [
    (CacheType::UserData, 1800, "user:"),
    (CacheType::AnalysisResults, 7200, "analysis:"),
    (CacheType::MatchingResults, 3600, "match:"),
    (CacheType::ApiResponses, 300, "api:"),
    (CacheType::SessionData, 86400, "session:"),
    (CacheType::StaticContent, 86400, "static:"),
];

// == Strategy Registry ==
/// Immutable cache-type → strategy table, built once at startup.
///
/// TTLs are scaled by the environment multiplier with a 1-second floor so
/// development environments expire aggressively without producing a zero TTL.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    strategies: [Strategy; 6],
}

impl StrategyRegistry {
    // == Constructor ==
    /// Builds the registry for the given environment and validates it.
    pub fn new(environment: Environment) -> Result<Self> {
        let multiplier = environment.ttl_multiplier();
        let mut strategies = Vec::with_capacity(STRATEGY_TABLE.len());

        for (cache_type, base_ttl, prefix) in STRATEGY_TABLE {
            let scaled = ((base_ttl as f64) * multiplier).round() as u64;
            let strategy = Strategy {
                ttl_seconds: scaled.max(1),
                prefix,
            };
            // Table order must match CacheType::ALL order
            debug_assert_eq!(CacheType::ALL[strategies.len()], cache_type);
            strategies.push(strategy);
        }

        let strategies: [Strategy; 6] = strategies
            .try_into()
            .map_err(|_| CacheError::Config("Strategy table size mismatch".to_string()))?;

        let registry = Self { strategies };
        registry.validate()?;
        Ok(registry)
    }

    // == Validate ==
    /// Checks every strategy once at construction: positive TTLs, non-empty
    /// prefixes, no prefix collisions.
    fn validate(&self) -> Result<()> {
        for (idx, strategy) in self.strategies.iter().enumerate() {
            let cache_type = CacheType::ALL[idx];
            if strategy.ttl_seconds == 0 {
                return Err(CacheError::Config(format!(
                    "Cache type {} has zero TTL",
                    cache_type
                )));
            }
            if strategy.prefix.is_empty() {
                return Err(CacheError::Config(format!(
                    "Cache type {} has empty prefix",
                    cache_type
                )));
            }
        }

        for (i, a) in self.strategies.iter().enumerate() {
            for b in self.strategies.iter().skip(i + 1) {
                if a.prefix == b.prefix {
                    return Err(CacheError::Config(format!(
                        "Duplicate key prefix: {}",
                        a.prefix
                    )));
                }
            }
        }

        Ok(())
    }

    // == Lookup ==
    /// Returns the strategy for a cache type. Total: every variant is in
    /// the table by construction.
    pub fn strategy(&self, cache_type: CacheType) -> &Strategy {
        &self.strategies[cache_type as usize]
    }

    /// Iterates (type, strategy) pairs, for the admin config endpoint.
    pub fn iter(&self) -> impl Iterator<Item = (CacheType, &Strategy)> {
        CacheType::ALL
            .into_iter()
            .map(move |t| (t, &self.strategies[t as usize]))
    }
}
