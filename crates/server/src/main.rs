use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubefetch_core::{
    load_config, validate_config, ArtifactStore, GarbageCollector, JobRunner, ProcessExecutor,
    TokioProcessExecutor,
};
use tubefetch_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TUBEFETCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Downloader binary: {:?}", config.fetcher.binary);
    info!("Artifact directory: {:?}", config.storage.artifact_dir);

    // Artifact store
    let store = Arc::new(ArtifactStore::new(
        config.storage.artifact_dir.clone(),
        config.storage.cleanup_policy(),
    ));
    store
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create {:?}", config.storage.artifact_dir))?;

    // Job runner
    let executor: Arc<dyn ProcessExecutor> = Arc::new(TokioProcessExecutor::new());
    let runner = Arc::new(JobRunner::new(&config, executor, Arc::clone(&store)));
    info!(
        "Job runner ready (max {} concurrent jobs)",
        runner.max_concurrent()
    );

    // Garbage collector
    let gc = Arc::new(GarbageCollector::new(Arc::clone(&store)));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let gc_handle = Arc::clone(&gc).spawn(shutdown_rx);
    info!(
        "Garbage collector started (ttl {}s, sweep every {}s)",
        config.storage.ttl_secs, config.storage.sweep_interval_secs
    );

    let state = Arc::new(AppState::new(config.clone(), runner, gc));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    let _ = shutdown_tx.send(());
    if let Err(e) = gc_handle.await {
        warn!("Garbage collector task ended abnormally: {}", e);
    }
    info!("Garbage collector stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
