//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{HealthReport, StatsSnapshot};
use crate::store::ConnectionState;

/// Response body for GET /admin/cache/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the backing store answers, "degraded" otherwise
    pub status: &'static str,
    #[serde(flatten)]
    pub report: HealthReport,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn from_report(report: HealthReport) -> Self {
        Self {
            status: if report.connected { "healthy" } else { "degraded" },
            report,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for GET /admin/cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub state: ConnectionState,
}

/// Response body for POST /admin/cache/clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Entries removed across both stores
    pub removed: usize,
    /// Cache type cleared, or "all"
    pub cache_type: String,
}

/// One strategy row for the config endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyInfo {
    pub cache_type: &'static str,
    pub ttl_seconds: u64,
    pub prefix: &'static str,
}

/// Response body for GET /admin/cache/config
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub environment: &'static str,
    pub namespace: String,
    /// Connection URL with the password masked
    pub redis_url: String,
    pub redis_enabled: bool,
    pub pool_size: usize,
    pub strategies: Vec<StrategyInfo>,
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(connected: bool) -> HealthReport {
        HealthReport {
            connected,
            latency_ms: 1.5,
            hit_rate: 0.75,
            using_fallback: !connected,
            state: if connected {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            },
        }
    }

    #[test]
    fn test_health_response_status_tracks_connectivity() {
        assert_eq!(HealthResponse::from_report(report(true)).status, "healthy");
        assert_eq!(
            HealthResponse::from_report(report(false)).status,
            "degraded"
        );
    }

    #[test]
    fn test_health_response_serializes_flattened_report() {
        let json =
            serde_json::to_value(HealthResponse::from_report(report(true))).unwrap();
        assert_eq!(json["connected"], true);
        assert_eq!(json["hit_rate"], 0.75);
        assert_eq!(json["state"], "connected");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
