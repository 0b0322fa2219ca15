//! DriveMesh server binary.
//!
//! Loads configuration, wires the Metadata Store, Backend Client, Account
//! Registry, Load Balancer, Object Engine, VFS, and Audit Service together
//! into one `ApiState`, serves the HTTP API, and runs a periodic trash
//! sweep alongside it.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use drivemesh_audit::AuditService;
use drivemesh_backend::client::GraphClient;
use drivemesh_backend::{GraphAuthFlow, GraphBackendClient};
use drivemesh_balancer::{LoadBalancer, Strategy};
use drivemesh_cache::{DatabasePool, SqliteMetadataStore};
use drivemesh_core::config::Config;
use drivemesh_core::ports::{AuthFlow, BackendClient, MetadataStore};
use drivemesh_core::usecases::AccountRegistry;
use drivemesh_engine::{MultipartSession, ObjectEngine};
use drivemesh_vfs::{RecentService, SearchService, StarredService, TaskEngine, TrashService, VfsService};

use drivemesh_api::ApiState;

/// How often the trash sweep runs. Expired entries are only ever purged
/// by this loop or an explicit per-entry purge, so an hour is a
/// compromise between timely reclamation and idle wakeups.
const TRASH_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

fn config_path() -> PathBuf {
    std::env::var("DRIVEMESH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Config::default_path())
}

fn init_tracing(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load_or_default(&config_path());
    init_tracing(&config);

    let pool = DatabasePool::new(&config.database.path)
        .await
        .context("failed to open metadata store")?;
    let store: Arc<dyn MetadataStore> = Arc::new(SqliteMetadataStore::new(pool.pool().clone()));

    let auth: Arc<dyn AuthFlow> = Arc::new(GraphAuthFlow::new());
    let backend: Arc<dyn BackendClient> = Arc::new(GraphBackendClient::new(GraphClient::new("")));
    let registry = Arc::new(AccountRegistry::new(store.clone(), auth.clone()));

    let strategy = Strategy::from_str(&config.storage.load_balance.strategy)
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid load balancing strategy")?;
    let balancer = Arc::new(LoadBalancer::new(strategy));

    let chunk_threshold = config.storage.upload.chunk_threshold_mb * 1024 * 1024;
    let chunk_size = config.storage.upload.chunk_size_mb * 1024 * 1024;
    let engine = Arc::new(ObjectEngine::new(
        store.clone(),
        backend.clone(),
        registry.clone(),
        balancer.clone(),
        chunk_threshold,
        chunk_size,
        None,
    ));
    let multipart = Arc::new(MultipartSession::new(
        store.clone(),
        backend.clone(),
        registry.clone(),
        balancer.clone(),
    ));

    let vfs = Arc::new(VfsService::new(store.clone(), engine.clone()));
    let task_engine = Arc::new(TaskEngine::new(store.clone(), engine.clone()));
    let trash = Arc::new(TrashService::new(store.clone(), engine.clone()));
    let starred = Arc::new(StarredService::new(store.clone()));
    let recent = Arc::new(RecentService::new(store.clone()));
    let search = Arc::new(SearchService::new(store.clone()));
    let audit = Arc::new(AuditService::new(store.clone(), backend.clone(), registry.clone()));

    let state = ApiState {
        store,
        backend,
        auth,
        registry,
        balancer,
        engine,
        multipart,
        vfs,
        task_engine,
        trash: trash.clone(),
        starred,
        recent,
        search,
        audit,
        config: Arc::new(config.clone()),
        known_tasks: Arc::new(DashMap::new()),
        pending_oauth: Arc::new(DashMap::new()),
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(trash_sweep_loop(trash, shutdown.clone()));

    let bind_address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(%bind_address, "drivemesh server listening");

    let app = drivemesh_api::build(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server loop exited")?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    cancel.cancel();
}

async fn trash_sweep_loop(trash: Arc<TrashService>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(TRASH_SWEEP_INTERVAL);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match trash.sweep().await {
                    Ok(count) if count > 0 => info!(count, "trash sweep purged expired entries"),
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "trash sweep failed"),
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }
}
