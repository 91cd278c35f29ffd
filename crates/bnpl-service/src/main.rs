//! BNPL Service - HTTP API for installment plans, debt and refunds
//!
//! This is the main entry point for the BNPL service.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bnpl_core::SystemClock;
use bnpl_engine::Ledger;
use bnpl_service::{create_router, seed, AppState, Scheduler, ServiceConfig, StorageBackend};
use bnpl_store::{MemoryStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bnpl=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BNPL Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        storage_backend = ?config.storage_backend,
        data_dir = %config.data_dir,
        webhook_secret_configured = %config.webhook_secret.is_some(),
        seed_demo_users = %config.seed_demo_users,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let ledger = Arc::new(Ledger::new(
        store,
        Arc::new(SystemClock),
        config.ledger_config(),
    ));

    if config.seed_demo_users {
        let created = seed::seed_demo_users(&ledger)?;
        tracing::info!(created, "Demo users seeded");
    }

    let scheduler = Scheduler::new(
        Duration::from_secs(config.overdue_sweep_interval_seconds),
        Duration::from_secs(config.idempotency_purge_interval_seconds),
    )
    .start(Arc::clone(&ledger));

    // Build app state and router
    let state = AppState::new(ledger, config.clone());
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store - data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::RocksDb => open_rocks(&config.data_dir),
    }
}

#[cfg(feature = "rocksdb-backend")]
fn open_rocks(data_dir: &str) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %data_dir, "Opening RocksDB store");
    Ok(Arc::new(bnpl_store::RocksStore::open(data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_rocks(_data_dir: &str) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    Err("STORAGE_BACKEND=rocksdb requires building with the rocksdb-backend feature".into())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
