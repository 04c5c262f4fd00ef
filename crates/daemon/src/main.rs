//! ezyQ Queue Engine - Daemon Entry Point

mod config;

use anyhow::{anyhow, Result};
use config::{DaemonConfig, LogFormat};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ezyq_api_rpc::RpcServer;
use ezyq_core::application::{EngineConfig, MaintenanceScheduler, QueueService};
use ezyq_core::port::id_provider::UuidProvider;
use ezyq_core::port::time_provider::SystemTimeProvider;
use ezyq_core::port::Repositories;
use ezyq_infra_sqlite::{create_pool, run_migrations, SqliteMaintenance, SqliteQueueStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("ezyq=info"))
        .map_err(|e| anyhow!("Failed to create env filter: {}", e))?;

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration, then logging
    let config = DaemonConfig::from_env()?;
    init_logging(config.log_format)?;

    info!("ezyQ queue engine v{} starting...", VERSION);

    // 2. Database
    if let Some(dir) = Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(dir)?;
    }
    info!(db_path = %config.db_path, "Initializing database...");

    let pool = create_pool(&config.database_url())
        .await
        .map_err(|e| anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow!("Migration failed: {}", e))?;

    // 3. Wiring
    let clock = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteQueueStore::new(pool.clone()));
    let service = Arc::new(QueueService::new(
        Repositories::from_store(store),
        Arc::new(UuidProvider),
        clock.clone(),
        EngineConfig::default(),
    ));
    let maintenance = Arc::new(SqliteMaintenance::new(pool, clock));

    // 4. JSON-RPC server (manual maintenance shares the retention settings)
    let manual_maintenance = Arc::new(MaintenanceScheduler::new(
        maintenance.clone(),
        config.maintenance.clone(),
        config.maintenance_interval_hours,
    ));
    let rpc_handle = RpcServer::new(config.rpc.clone(), service, manual_maintenance)
        .start()
        .await
        .map_err(|e| anyhow!("RPC server start failed: {}", e))?;

    // 5. Periodic maintenance
    let scheduler = MaintenanceScheduler::new(
        maintenance,
        config.maintenance.clone(),
        config.maintenance_interval_hours,
    );
    let maintenance_handle = tokio::spawn(scheduler.run());

    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Shutdown
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    maintenance_handle.abort();
    rpc_handle
        .stop()
        .map_err(|e| anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    info!("Shutdown complete.");
    Ok(())
}
