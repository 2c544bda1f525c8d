//! Typed Cache Wrappers
//!
//! Thin collaborator-facing wrappers handed out by the factory. Each one
//! is a stateless key formatter over the shared manager with a fixed cache
//! type; no logic lives here.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::CacheManager;
use crate::error::Result;
use crate::strategy::CacheType;

// == User Data Cache ==
/// Profile, interests and skills per user id.
#[derive(Clone)]
pub struct UserDataCache {
    manager: Arc<CacheManager>,
}

impl UserDataCache {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.manager
    }

    pub async fn profile<T: DeserializeOwned>(&self, user_id: u64) -> Result<Option<T>> {
        self.manager
            .get(&format!("{}:profile", user_id), CacheType::UserData)
            .await
    }

    pub async fn set_profile<T: Serialize>(&self, user_id: u64, profile: &T) -> Result<()> {
        self.manager
            .set(&format!("{}:profile", user_id), profile, CacheType::UserData, None)
            .await
    }

    pub async fn interests<T: DeserializeOwned>(&self, user_id: u64) -> Result<Option<T>> {
        self.manager
            .get(&format!("{}:interests", user_id), CacheType::UserData)
            .await
    }

    pub async fn set_interests<T: Serialize>(&self, user_id: u64, interests: &T) -> Result<()> {
        self.manager
            .set(
                &format!("{}:interests", user_id),
                interests,
                CacheType::UserData,
                None,
            )
            .await
    }

    pub async fn skills<T: DeserializeOwned>(&self, user_id: u64) -> Result<Option<T>> {
        self.manager
            .get(&format!("{}:skills", user_id), CacheType::UserData)
            .await
    }

    pub async fn set_skills<T: Serialize>(&self, user_id: u64, skills: &T) -> Result<()> {
        self.manager
            .set(&format!("{}:skills", user_id), skills, CacheType::UserData, None)
            .await
    }

    /// Drops profile, interests and skills for one user. Returns how many
    /// entries existed.
    pub async fn invalidate(&self, user_id: u64) -> Result<usize> {
        let mut removed = 0;
        for suffix in ["profile", "interests", "skills"] {
            if self
                .manager
                .delete(&format!("{}:{}", user_id, suffix), CacheType::UserData)
                .await?
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// == Analysis Cache ==
/// Third-party analysis results: per-username profile analysis and
/// per-content-hash analysis.
#[derive(Clone)]
pub struct AnalysisCache {
    manager: Arc<CacheManager>,
}

impl AnalysisCache {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }

    pub async fn profile_analysis<T: DeserializeOwned>(
        &self,
        username: &str,
    ) -> Result<Option<T>> {
        self.manager
            .get(&format!("profile:{}", username), CacheType::AnalysisResults)
            .await
    }

    pub async fn set_profile_analysis<T: Serialize>(
        &self,
        username: &str,
        analysis: &T,
    ) -> Result<()> {
        self.manager
            .set(
                &format!("profile:{}", username),
                analysis,
                CacheType::AnalysisResults,
                None,
            )
            .await
    }

    pub async fn content_analysis<T: DeserializeOwned>(
        &self,
        content_hash: &str,
    ) -> Result<Option<T>> {
        self.manager
            .get(
                &format!("content:{}", content_hash),
                CacheType::AnalysisResults,
            )
            .await
    }

    pub async fn set_content_analysis<T: Serialize>(
        &self,
        content_hash: &str,
        analysis: &T,
    ) -> Result<()> {
        self.manager
            .set(
                &format!("content:{}", content_hash),
                analysis,
                CacheType::AnalysisResults,
                None,
            )
            .await
    }
}

// == Matching Cache ==
/// Match lists per (user, limit) and pairwise similarity scores.
#[derive(Clone)]
pub struct MatchingCache {
    manager: Arc<CacheManager>,
}

impl MatchingCache {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }

    pub async fn matches<T: DeserializeOwned>(
        &self,
        user_id: u64,
        limit: usize,
    ) -> Result<Option<T>> {
        self.manager
            .get(
                &format!("user:{}:limit:{}", user_id, limit),
                CacheType::MatchingResults,
            )
            .await
    }

    pub async fn set_matches<T: Serialize>(
        &self,
        user_id: u64,
        limit: usize,
        matches: &T,
    ) -> Result<()> {
        self.manager
            .set(
                &format!("user:{}:limit:{}", user_id, limit),
                matches,
                CacheType::MatchingResults,
                None,
            )
            .await
    }

    /// Pair keys are order-normalized so (a, b) and (b, a) share an entry.
    fn pair_key(a: u64, b: u64) -> String {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        format!("similarity:{}:{}", lo, hi)
    }

    pub async fn similarity<T: DeserializeOwned>(&self, a: u64, b: u64) -> Result<Option<T>> {
        self.manager
            .get(&Self::pair_key(a, b), CacheType::MatchingResults)
            .await
    }

    pub async fn set_similarity<T: Serialize>(&self, a: u64, b: u64, scores: &T) -> Result<()> {
        self.manager
            .set(&Self::pair_key(a, b), scores, CacheType::MatchingResults, None)
            .await
    }
}

// == Session Cache ==
#[derive(Clone)]
pub struct SessionCache {
    manager: Arc<CacheManager>,
}

impl SessionCache {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }

    pub async fn get<T: DeserializeOwned>(&self, session_id: &str) -> Result<Option<T>> {
        self.manager.get(session_id, CacheType::SessionData).await
    }

    pub async fn set<T: Serialize>(&self, session_id: &str, data: &T) -> Result<()> {
        self.manager
            .set(session_id, data, CacheType::SessionData, None)
            .await
    }

    pub async fn delete(&self, session_id: &str) -> Result<bool> {
        self.manager.delete(session_id, CacheType::SessionData).await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use crate::factory::CacheFactory;

    fn factory() -> CacheFactory {
        let config = Config {
            environment: Environment::Production,
            namespace: "typed_test:".to_string(),
            ..Config::default()
        };
        CacheFactory::in_memory(&config).unwrap()
    }

    #[tokio::test]
    async fn test_user_data_roundtrip_and_invalidate() {
        let users = factory().user_data();

        users
            .set_profile(42, &serde_json::json!({"name": "Alice"}))
            .await
            .unwrap();
        users
            .set_interests(42, &vec!["ml".to_string(), "rust".to_string()])
            .await
            .unwrap();

        let profile: Option<serde_json::Value> = users.profile(42).await.unwrap();
        assert_eq!(profile.unwrap()["name"], "Alice");

        let removed = users.invalidate(42).await.unwrap();
        assert_eq!(removed, 2);

        let profile: Option<serde_json::Value> = users.profile(42).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn test_analysis_cache_keys_are_distinct() {
        let analysis = factory().analysis();

        analysis
            .set_profile_analysis("alice", &"profile_result")
            .await
            .unwrap();
        analysis
            .set_content_analysis("abc123", &"content_result")
            .await
            .unwrap();

        let got: Option<String> = analysis.profile_analysis("alice").await.unwrap();
        assert_eq!(got.as_deref(), Some("profile_result"));
        let got: Option<String> = analysis.content_analysis("abc123").await.unwrap();
        assert_eq!(got.as_deref(), Some("content_result"));
        let got: Option<String> = analysis.profile_analysis("bob").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_similarity_key_order_normalized() {
        let matching = factory().matching();

        matching.set_similarity(7, 3, &0.87f64).await.unwrap();

        let forward: Option<f64> = matching.similarity(3, 7).await.unwrap();
        let backward: Option<f64> = matching.similarity(7, 3).await.unwrap();
        assert_eq!(forward, Some(0.87));
        assert_eq!(backward, Some(0.87));
    }

    #[tokio::test]
    async fn test_session_cache_lifecycle() {
        let sessions = factory().sessions();

        sessions
            .set("sess-1", &serde_json::json!({"user_id": 42}))
            .await
            .unwrap();
        let got: Option<serde_json::Value> = sessions.get("sess-1").await.unwrap();
        assert_eq!(got.unwrap()["user_id"], 42);

        assert!(sessions.delete("sess-1").await.unwrap());
        let got: Option<serde_json::Value> = sessions.get("sess-1").await.unwrap();
        assert!(got.is_none());
    }
}
