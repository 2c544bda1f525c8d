//! Stratacache - A tiered key/value caching subsystem
//!
//! Routes reads and writes to a Redis backing store, degrading
//! transparently to an in-process fallback store when the backing store is
//! unreachable. Per-type TTL and key-prefix strategies, a memoization
//! helper, and an HTTP admin surface for health, stats and cache clearing.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod models;
pub mod serialize;
pub mod store;
pub mod strategy;
pub mod tasks;
pub mod typed;

pub use api::{create_router, AppState};
pub use cache::{CacheManager, HealthReport};
pub use config::{Config, Environment};
pub use error::{CacheError, Result};
pub use factory::CacheFactory;
pub use strategy::{CacheType, StrategyRegistry};
pub use tasks::{spawn_cleanup_task, spawn_reconnect_task};
