//! Cross-tenant dashboard handler.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use caregrid_persistence::query::TenantQueryExecutor;
use chrono::Utc;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::ActorExtractor;
use crate::responses::DashboardBody;
use crate::state::AppState;

/// Handler for the per-tenant appointment summary.
///
/// # HTTP Request
///
/// `GET [base]/dashboard`
///
/// # Response
///
/// - `200 OK` - `{tenants: [{tenant_id, tenant_name, counts, next_appointment}], totals}`
/// - `403 Forbidden` - The actor has no identity record
pub async fn dashboard_handler<E>(
    State(state): State<AppState<E>>,
    actor: ActorExtractor,
) -> RestResult<Response>
where
    E: TenantQueryExecutor + 'static,
{
    let actor = actor.into_inner();
    debug!(actor = %actor, "Processing dashboard request");

    let summary = state.aggregator().dashboard(actor, Utc::now()).await?;

    let body = DashboardBody::new(&summary, state.expose_partial_failures());
    Ok((StatusCode::OK, Json(body)).into_response())
}
