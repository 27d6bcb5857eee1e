//! Idempotency Service - deduplicates retried operations
//!
//! Lets a caller atomically claim an idempotency key exactly once
//! within a time window.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idempotency_service::api::{create_router, ApiKeyProvider, AppState};
use idempotency_service::config::{Config, StoreBackend};
use idempotency_service::store::{IdempotencyStore, InMemoryStore, RedisStore};
use idempotency_service::tasks::spawn_sweep_task;

/// Main entry point for the idempotency service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the API key file, if configured
/// 4. Construct the store backend selected by configuration
/// 5. Start the background expiry sweep (in-process backend only)
/// 6. Create Axum router with all endpoints
/// 7. Start HTTP server on configured port
/// 8. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idempotency_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Idempotency Service");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, default_ttl={}s, port={}, sweep_interval={}s",
        config.backend, config.default_ttl, config.server_port, config.sweep_interval
    );

    // Load the API key, if configured
    let auth = match &config.api_key_file {
        Some(path) => ApiKeyProvider::from_file(path)?,
        None => {
            warn!("No API key file configured, authentication disabled");
            ApiKeyProvider::disabled()
        }
    };

    // Construct the store backend selected by configuration; only the
    // in-process backend needs the sweep, Redis expires keys natively
    let mut sweep_handle: Option<JoinHandle<()>> = None;
    let store: Arc<dyn IdempotencyStore> = match config.backend {
        StoreBackend::Memory => {
            let store = Arc::new(InMemoryStore::new());
            sweep_handle = Some(spawn_sweep_task(Arc::clone(&store), config.sweep_interval));
            info!("In-process store initialized, background sweep started");
            store
        }
        StoreBackend::Redis => {
            let store = RedisStore::connect(
                &config.redis_host,
                config.redis_port,
                Duration::from_millis(config.redis_timeout_ms),
            )
            .await
            .map_err(|err| anyhow::anyhow!("redis backend startup failed: {}", err))?;
            info!(
                "Redis store connected to {}:{}",
                config.redis_host, config.redis_port
            );
            Arc::new(store)
        }
    };

    // Create router with all endpoints
    let state = AppState::new(store, auth, config.default_ttl);
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: Option<JoinHandle<()>>) {
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

    // Abort the sweep task
    if let Some(handle) = sweep_handle {
        handle.abort();
        warn!("Sweep task aborted");
    }
}
