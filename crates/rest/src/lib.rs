//! # caregrid-rest - CareGrid HTTP API
//!
//! This crate exposes the cross-tenant views of the CareGrid
//! practice-management system over HTTP. A practitioner or patient linked to
//! several practices gets one merged view of their appointments, a per-tenant
//! dashboard and the list of their practices.
//!
//! ## Backend Support
//!
//! Storage backends are configured through feature flags:
//!
//! - `sqlite` - SQLite central and per-tenant databases (default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use caregrid_persistence::aggregate::CrossTenantAggregator;
//! use caregrid_persistence::backends::sqlite::{SqliteCentralStore, SqliteTenantDatabases};
//! use caregrid_persistence::identity::BlindIndexer;
//! use caregrid_rest::{ServerConfig, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let central = Arc::new(SqliteCentralStore::in_memory(BlindIndexer::new("key")?)?);
//!     let tenants = Arc::new(SqliteTenantDatabases::in_memory()?);
//!     let aggregator = CrossTenantAggregator::new(
//!         central.clone(),
//!         central.clone(),
//!         tenants,
//!         config.aggregation_config(),
//!     );
//!
//!     let app = create_app_with_config(aggregator, central, config);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `GET /appointments` | Merged, paginated appointment list |
//! | `GET /dashboard` | Appointment counts per tenant and in total |
//! | `GET /tenants` | Accepted linked tenants |
//! | `GET /health` | Central database health |
//!
//! ## HTTP Headers
//!
//! - `X-Actor-Type` - `practitioner` or `patient`
//! - `X-Actor-ID` - Central id of the actor
//! - `X-Request-ID` - Request correlation id (generated when absent)
//!
//! ## Error Handling
//!
//! Errors are returned as `{"error": {"code", "message"}}`:
//!
//! | HTTP Status | Code | Description |
//! |-------------|------|-------------|
//! | 400 | invalid | Missing or invalid actor headers |
//! | 403 | forbidden | Actor has no identity record |
//! | 503 | unavailable | Central database unreachable |
//! | 500 | exception | Internal server error |
//!
//! A tenant that fails mid-request never fails the request. Its rows are
//! left out; with `expose_partial_failures` enabled the response also
//! carries `partial` and `failed_tenants`.
//!
//! ## Architecture
//!
//! - [`error`] - Error types and JSON error bodies
//! - [`config`] - Server configuration
//! - [`state`] - Application state (aggregator, health probe, configuration)
//! - [`handlers`] - HTTP request handlers
//! - [`extractors`] - Actor and query parameter extractors
//! - [`responses`] - Response bodies
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::{AppState, HealthCheck};

use std::sync::Arc;

use axum::Router;
use caregrid_persistence::aggregate::CrossTenantAggregator;
use caregrid_persistence::query::TenantQueryExecutor;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<E>(aggregator: CrossTenantAggregator<E>, health: Arc<dyn HealthCheck>) -> Router
where
    E: TenantQueryExecutor + 'static,
{
    create_app_with_config(aggregator, health, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// Sets up all routes and the middleware stack (tracing, timeout, CORS and
/// request ids, as configured).
///
/// # Arguments
///
/// * `aggregator` - The cross-tenant aggregator serving the views
/// * `health` - Probe for the central database
/// * `config` - Server configuration
pub fn create_app_with_config<E>(
    aggregator: CrossTenantAggregator<E>,
    health: Arc<dyn HealthCheck>,
    config: ServerConfig,
) -> Router
where
    E: TenantQueryExecutor + 'static,
{
    info!(
        backend = health.backend_name(),
        max_tenants = aggregator.config().max_tenants,
        deadline = ?aggregator.config().deadline,
        "Creating CareGrid API server"
    );

    let state = AppState::new(aggregator, health, config.clone());

    let router = routing::create_routes(state);

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    let router = router.layer(service_builder);

    // Request ids wrap everything so the trace span can see them
    if config.enable_request_id {
        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    } else {
        router
    }
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` takes
/// precedence over `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "caregrid={level},caregrid_rest={level},caregrid_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
