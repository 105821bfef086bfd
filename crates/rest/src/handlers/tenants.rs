//! Linked tenants handler.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use caregrid_persistence::query::TenantQueryExecutor;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::ActorExtractor;
use crate::responses::TenantsBody;
use crate::state::AppState;

/// Handler listing the practices the actor belongs to.
///
/// Only accepted links are listed. No tenant database is opened.
///
/// # HTTP Request
///
/// `GET [base]/tenants`
pub async fn tenants_handler<E>(
    State(state): State<AppState<E>>,
    actor: ActorExtractor,
) -> RestResult<Response>
where
    E: TenantQueryExecutor + 'static,
{
    let actor = actor.into_inner();
    debug!(actor = %actor, "Processing linked tenants request");

    let tenants = state.aggregator().linked_tenants(&actor).await?;

    Ok((StatusCode::OK, Json(TenantsBody { tenants: &tenants })).into_response())
}
