//! Stratacache - A tiered key/value caching subsystem
//!
//! Composition root: builds the cache from configuration, starts the
//! background tasks and serves the admin surface.

mod api;
mod cache;
mod config;
mod error;
mod factory;
mod models;
mod serialize;
mod store;
mod strategy;
mod tasks;
mod typed;

use std::net::SocketAddr;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use factory::CacheFactory;
use tasks::{spawn_cleanup_task, spawn_reconnect_task};

/// Main entry point for the cache admin server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache manager (backing store + fallback) via the factory
/// 4. Start the fallback expiry sweep and the reconnect loop
/// 5. Create Axum router with the admin endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratacache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stratacache");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        environment = config.environment.as_str(),
        namespace = %config.namespace,
        redis_url = %config.masked_redis_url(),
        redis_enabled = config.redis_enabled,
        port = config.server_port,
        "Configuration loaded"
    );

    // Build the cache manager; an unreachable backing store degrades to
    // fallback-only instead of failing startup
    let factory = match CacheFactory::from_config(&config).await {
        Ok(factory) => factory,
        Err(e) => {
            eprintln!("Invalid cache configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Start background tasks
    let mut task_handles: Vec<JoinHandle<()>> = Vec::new();
    task_handles.push(spawn_cleanup_task(
        factory.manager(),
        config.cleanup_interval,
    ));
    if let Some(remote) = factory.remote() {
        task_handles.push(spawn_reconnect_task(remote, config.reconnect_interval));
    }
    info!("Background tasks started");

    // Create router with the admin endpoints
    let app = create_router(AppState::new(factory.manager(), config.clone()));

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Could not bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Admin surface listening on http://{}", addr);

    // Start server with graceful shutdown
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(task_handles))
        .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and allows graceful
/// shutdown.
async fn shutdown_signal(task_handles: Vec<tokio::task::JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in task_handles {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
