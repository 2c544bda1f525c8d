//! Error types for the caching subsystem
//!
//! Provides unified error handling using thiserror.
//!
//! Two error families exist: `CacheError` is what callers of the cache
//! manager see (programmer or configuration mistakes), while store-level
//! failures (`crate::store::StoreError`) are absorbed by the fallback
//! routing and never reach the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors surfaced to callers of the cache manager and admin API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Value could not be serialized in any supported format
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// TTL override was zero or otherwise unusable
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Invalid configuration (unknown cache type, bad strategy table)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Admin API key missing or wrong
    #[error("Unauthorized")]
    Unauthorized,
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::InvalidTtl(_) => StatusCode::BAD_REQUEST,
            CacheError::Config(_) => StatusCode::BAD_REQUEST,
            CacheError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching subsystem.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                CacheError::Serialization("bad".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CacheError::InvalidTtl("zero".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::Config("unknown".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (CacheError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_is_error_response() {
        let response = CacheError::Config("Unknown cache type: bogus".to_string())
            .into_response();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json["error"].as_str().unwrap(),
            "Configuration error: Unknown cache type: bogus"
        );
    }
}
