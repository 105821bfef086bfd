//! API route configuration.
//!
//! Defines all routes of the CareGrid HTTP API.

use axum::{Router, routing::get};
use caregrid_persistence::query::TenantQueryExecutor;

use crate::handlers;
use crate::state::AppState;

/// Creates all API routes.
///
/// # Routes
///
/// ## Aggregate views (require `X-Actor-Type` and `X-Actor-ID`)
/// - `GET /appointments` - Merged appointment list
/// - `GET /dashboard` - Per-tenant appointment counts
/// - `GET /tenants` - Accepted linked tenants
///
/// ## System-level
/// - `GET /health` - Health check
/// - `GET /_liveness` - Liveness probe
pub fn create_routes<E>(state: AppState<E>) -> Router
where
    E: TenantQueryExecutor + 'static,
{
    Router::new()
        // Aggregate views
        .route("/appointments", get(handlers::appointments_handler::<E>))
        .route("/dashboard", get(handlers::dashboard_handler::<E>))
        .route("/tenants", get(handlers::tenants_handler::<E>))
        // System-level routes
        .route("/health", get(handlers::health_handler::<E>))
        .route("/_liveness", get(handlers::liveness_handler))
        // State
        .with_state(state)
}
