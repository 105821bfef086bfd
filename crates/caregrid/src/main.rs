//! CareGrid server
//!
//! Serves cross-tenant appointment views for practitioners and patients who
//! belong to several practices.

use clap::Parser;
use caregrid_rest::{ServerConfig, create_app_with_config, init_logging};
use tracing::info;

#[cfg(feature = "sqlite")]
use std::{sync::Arc, time::Duration};

#[cfg(feature = "sqlite")]
use caregrid_persistence::{
    CrossTenantAggregator,
    backends::sqlite::{SqliteBackendConfig, SqliteCentralStore, SqliteTenantDatabases},
    identity::BlindIndexer,
};

/// Opens the central SQLite database.
#[cfg(feature = "sqlite")]
fn create_central_store(config: &ServerConfig) -> anyhow::Result<SqliteCentralStore> {
    let key = config
        .blind_index_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("A blind index key is required"))?;
    let indexer = BlindIndexer::new(key)?;

    info!(database = %config.central_database, "Initializing central database");
    let store = if config.is_memory() {
        SqliteCentralStore::in_memory(indexer)?
    } else {
        SqliteCentralStore::open(&config.central_database, &SqliteBackendConfig::default(), indexer)?
    };
    Ok(store)
}

/// Opens the per-tenant SQLite databases.
#[cfg(feature = "sqlite")]
fn create_tenant_databases(config: &ServerConfig) -> anyhow::Result<SqliteTenantDatabases> {
    if config.is_memory() {
        info!("Using in-memory tenant databases");
        return Ok(SqliteTenantDatabases::in_memory()?);
    }

    let layout = config.tenant_database_config();
    info!(
        directory = %layout.database_dir.display(),
        template = %layout.file_template,
        "Initializing tenant databases"
    );
    Ok(SqliteTenantDatabases::open(layout, SqliteBackendConfig::default())?)
}

/// Closes tenant pools that have been idle longer than the configured timeout.
#[cfg(feature = "sqlite")]
fn spawn_idle_eviction(tenants: Arc<SqliteTenantDatabases>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = tenants.evict_idle();
            if evicted > 0 {
                info!(evicted, "Closed idle tenant pools");
            }
        }
    });
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        max_tenants = config.max_tenants,
        deadline = ?config.aggregation_deadline,
        "Starting CareGrid server"
    );

    start_sqlite(config).await
}

/// Starts the server with the SQLite backend.
#[cfg(feature = "sqlite")]
async fn start_sqlite(config: ServerConfig) -> anyhow::Result<()> {
    let central = Arc::new(create_central_store(&config)?);
    let tenants = Arc::new(create_tenant_databases(&config)?);

    let idle_timeout = Duration::from_secs(config.tenant_database_config().idle_timeout_secs.max(1));
    spawn_idle_eviction(tenants.clone(), idle_timeout);

    let aggregator = CrossTenantAggregator::new(
        central.clone(),
        central.clone(),
        tenants,
        config.aggregation_config(),
    );

    let app = create_app_with_config(aggregator, central, config.clone());
    serve(app, &config).await
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
async fn start_sqlite(_config: ServerConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "The sqlite backend requires the 'sqlite' feature. \
         Build with: cargo build -p caregrid --features sqlite"
    )
}
