//! API Module
//!
//! HTTP handlers and routing for the cache admin surface.
//!
//! # Endpoints
//! - `GET  /admin/cache/health` - Health report (open)
//! - `GET  /admin/cache/stats` - Operation counters
//! - `GET  /admin/cache/metrics` - Prometheus text exposition
//! - `POST /admin/cache/clear` - Clear a cache type or everything
//! - `GET  /admin/cache/config` - Effective configuration

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
