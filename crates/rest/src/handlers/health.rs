//! Health check endpoint handlers.
//!
//! Provides health endpoints for monitoring and load balancers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use caregrid_persistence::query::TenantQueryExecutor;
use tracing::{debug, warn};

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// Checks that the central database answers.
///
/// # HTTP Request
///
/// `GET [base]/health`
///
/// # Response
///
/// - `200 OK` - Server is healthy
/// - `503 Service Unavailable` - The central database cannot be reached
pub async fn health_handler<E>(State(state): State<AppState<E>>) -> Response
where
    E: TenantQueryExecutor + 'static,
{
    debug!("Processing health check request");

    let probe = state.health();
    let timestamp = chrono::Utc::now().to_rfc3339();

    match probe.check() {
        Ok(()) => {
            let body = serde_json::json!({
                "status": "healthy",
                "backend": probe.backend_name(),
                "timestamp": timestamp
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Central database health check failed");
            let body = serde_json::json!({
                "status": "unhealthy",
                "backend": probe.backend_name(),
                "timestamp": timestamp,
                "error": e.to_string()
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// Handler for a liveness probe.
///
/// # HTTP Request
///
/// `GET [base]/_liveness`
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}
