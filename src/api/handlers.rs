//! API Handlers
//!
//! HTTP request handlers for the cache admin surface. The health route is
//! open (load balancers poll it); everything else is guarded by the admin
//! API key when one is configured.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearRequest, ClearResponse, ConfigResponse, HealthResponse, StatsResponse, StrategyInfo,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<CacheManager>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(manager: Arc<CacheManager>, config: Config) -> Self {
        Self {
            manager,
            config: Arc::new(config),
        }
    }
}

/// Checks the `X-Admin-API-Key` header against the configured key.
/// Routes are open when no key is configured (development).
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = &state.config.admin_api_key else {
        return Ok(());
    };

    let provided = headers
        .get("x-admin-api-key")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == expected => Ok(()),
        _ => Err(CacheError::Unauthorized),
    }
}

/// Handler for GET /admin/cache/health
///
/// Open endpoint: performs the bounded, debounced backing-store probe and
/// reports connectivity, latency, hit rate and whether the fallback store
/// is in use.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.manager.health_check().await;
    Json(HealthResponse::from_report(report))
}

/// Handler for GET /admin/cache/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>> {
    authorize(&state, &headers)?;

    Ok(Json(StatsResponse {
        stats: state.manager.stats(),
        state: state.manager.connection_state(),
    }))
}

/// Handler for GET /admin/cache/metrics
///
/// Prometheus text exposition of the operation counters.
pub async fn metrics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    authorize(&state, &headers)?;

    let snapshot = state.manager.stats();
    let report = state.manager.health_check().await;

    let body = format!(
        "# TYPE cache_hits_total counter\n\
         cache_hits_total {}\n\
         # TYPE cache_misses_total counter\n\
         cache_misses_total {}\n\
         # TYPE cache_errors_total counter\n\
         cache_errors_total {}\n\
         # TYPE cache_hit_rate gauge\n\
         cache_hit_rate {}\n\
         # TYPE cache_connected gauge\n\
         cache_connected {}\n",
        snapshot.global.hits,
        snapshot.global.misses,
        snapshot.global.errors,
        snapshot.global.hit_rate,
        if report.connected { 1 } else { 0 },
    );

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Handler for POST /admin/cache/clear
///
/// Clears one cache type's prefix, or the whole namespace when no type is
/// given. Unknown type names are rejected, not defaulted.
pub async fn clear_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ClearRequest>,
) -> Result<Json<ClearResponse>> {
    authorize(&state, &headers)?;

    let cache_type = req.resolve()?;
    let removed = state.manager.clear(cache_type).await?;

    Ok(Json(ClearResponse {
        removed,
        cache_type: cache_type
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| "all".to_string()),
    }))
}

/// Handler for GET /admin/cache/config
///
/// Effective configuration with the connection password masked.
pub async fn config_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConfigResponse>> {
    authorize(&state, &headers)?;

    let strategies = state
        .manager
        .registry()
        .iter()
        .map(|(cache_type, strategy)| StrategyInfo {
            cache_type: cache_type.name(),
            ttl_seconds: strategy.ttl_seconds,
            prefix: strategy.prefix,
        })
        .collect();

    Ok(Json(ConfigResponse {
        environment: state.config.environment.as_str(),
        namespace: state.config.namespace.clone(),
        redis_url: state.config.masked_redis_url(),
        redis_enabled: state.config.redis_enabled,
        pool_size: state.config.pool_size,
        strategies,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::factory::CacheFactory;

    fn test_state(admin_key: Option<&str>) -> AppState {
        let config = Config {
            environment: Environment::Production,
            namespace: "handler_test:".to_string(),
            admin_api_key: admin_key.map(String::from),
            ..Config::default()
        };
        let factory = CacheFactory::in_memory(&config).unwrap();
        AppState::new(factory.manager(), config)
    }

    fn key_headers(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-admin-api-key", key.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn test_authorize_open_without_configured_key() {
        let state = test_state(None);
        assert!(authorize(&state, &HeaderMap::new()).is_ok());
    }

    #[tokio::test]
    async fn test_authorize_rejects_missing_or_wrong_key() {
        let state = test_state(Some("secret"));

        assert!(matches!(
            authorize(&state, &HeaderMap::new()),
            Err(CacheError::Unauthorized)
        ));
        assert!(matches!(
            authorize(&state, &key_headers("wrong")),
            Err(CacheError::Unauthorized)
        ));
        assert!(authorize(&state, &key_headers("secret")).is_ok());
    }

    #[tokio::test]
    async fn test_health_handler_reports_fallback_state() {
        let state = test_state(None);
        let response = health_handler(State(state)).await;
        // In-memory double answers the probe
        assert!(response.report.connected);
        assert!(!response.report.using_fallback);
    }

    #[tokio::test]
    async fn test_clear_handler_rejects_unknown_type() {
        let state = test_state(None);
        let req = ClearRequest {
            cache_type: Some("bogus".to_string()),
        };

        let result = clear_handler(State(state), HeaderMap::new(), Json(req)).await;
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[tokio::test]
    async fn test_config_handler_lists_all_strategies() {
        let state = test_state(None);
        let response = config_handler(State(state), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(response.strategies.len(), 6);
        assert_eq!(response.environment, "production");
    }
}
