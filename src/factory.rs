//! Cache Factory Module
//!
//! Builds exactly one `CacheManager` from configuration and hands out the
//! typed convenience wrappers. The factory is an explicitly constructed
//! object owned by the composition root and passed to collaborators; there
//! is no ambient global.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::Result;
use crate::store::{MemoryStore, RedisStore, RemoteStore};
use crate::strategy::StrategyRegistry;
use crate::typed::{AnalysisCache, MatchingCache, SessionCache, UserDataCache};

// == Cache Factory ==
pub struct CacheFactory {
    manager: Arc<CacheManager>,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl CacheFactory {
    // == Constructor ==
    /// Builds the registry, the backing store adapter and the single
    /// manager instance.
    ///
    /// Availability over consistency: an unreachable backing store at
    /// startup yields a usable fallback-only manager instead of an error.
    /// Only an invalid strategy table fails construction.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let registry = StrategyRegistry::new(config.environment)?;

        let remote: Option<Arc<dyn RemoteStore>> = if config.redis_enabled {
            match RedisStore::connect(config).await {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!(error = %e,
                        "Backing store pool could not be created, running fallback-only");
                    None
                }
            }
        } else {
            info!("Backing store disabled by configuration, running fallback-only");
            None
        };

        let manager = Arc::new(CacheManager::new(
            registry,
            config.namespace.clone(),
            remote.clone(),
            config.fallback_max_entries,
            Duration::from_millis(config.probe_timeout_ms),
        ));

        info!(
            environment = config.environment.as_str(),
            namespace = %config.namespace,
            "Cache manager initialized"
        );

        Ok(Self { manager, remote })
    }

    /// Test/embedded constructor over an arbitrary store.
    pub fn with_store(
        config: &Config,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Result<Self> {
        let registry = StrategyRegistry::new(config.environment)?;
        let manager = Arc::new(CacheManager::new(
            registry,
            config.namespace.clone(),
            remote.clone(),
            config.fallback_max_entries,
            Duration::from_millis(config.probe_timeout_ms),
        ));
        Ok(Self { manager, remote })
    }

    /// Fallback-only factory backed by an in-memory store double.
    pub fn in_memory(config: &Config) -> Result<Self> {
        Self::with_store(config, Some(Arc::new(MemoryStore::new())))
    }

    // == Accessors ==
    /// The shared manager. One instance per factory, per process by
    /// construction discipline.
    pub fn manager(&self) -> Arc<CacheManager> {
        Arc::clone(&self.manager)
    }

    /// Adapter handle for the background reconnect task.
    pub fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        self.remote.clone()
    }

    // == Typed Wrappers ==
    pub fn user_data(&self) -> UserDataCache {
        UserDataCache::new(self.manager())
    }

    pub fn analysis(&self) -> AnalysisCache {
        AnalysisCache::new(self.manager())
    }

    pub fn matching(&self) -> MatchingCache {
        MatchingCache::new(self.manager())
    }

    pub fn sessions(&self) -> SessionCache {
        SessionCache::new(self.manager())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn test_config() -> Config {
        Config {
            environment: Environment::Production,
            namespace: "factory_test:".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_factory_shares_one_manager() {
        let factory = CacheFactory::in_memory(&test_config()).unwrap();

        let a = factory.manager();
        let b = factory.user_data();

        // Wrappers delegate to the same manager instance
        assert!(Arc::ptr_eq(&a, b.manager()));
        assert!(Arc::ptr_eq(&a, &factory.manager()));
    }

    #[tokio::test]
    async fn test_factory_without_store_is_usable() {
        let factory = CacheFactory::with_store(&test_config(), None).unwrap();
        let manager = factory.manager();

        manager
            .set("k", &"v", crate::strategy::CacheType::UserData, None)
            .await
            .unwrap();
        let got: Option<String> = manager
            .get("k", crate::strategy::CacheType::UserData)
            .await
            .unwrap();
        assert_eq!(got.as_deref(), Some("v"));
    }
}
