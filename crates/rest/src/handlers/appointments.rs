//! Cross-tenant appointment list handler.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use caregrid_persistence::query::TenantQueryExecutor;
use tracing::{debug, warn};

use crate::error::RestResult;
use crate::extractors::{ActorExtractor, ListingParams};
use crate::responses::AppointmentsBody;
use crate::state::AppState;

/// Handler for the merged appointment list.
///
/// Visits every tenant the actor has an accepted link to and returns one
/// page of their appointments, newest first.
///
/// # HTTP Request
///
/// `GET [base]/appointments?status=&date_from=&date_to=&search=&perPage=&page=`
///
/// # Headers
///
/// - `X-Actor-Type` - `practitioner` or `patient`
/// - `X-Actor-ID` - Central id of the actor
///
/// # Response
///
/// - `200 OK` - `{items, pagination, filters}`
/// - `400 Bad Request` - Missing or invalid actor headers
/// - `403 Forbidden` - The actor has no identity record
pub async fn appointments_handler<E>(
    State(state): State<AppState<E>>,
    actor: ActorExtractor,
    ListingParams(query): ListingParams,
) -> RestResult<Response>
where
    E: TenantQueryExecutor + 'static,
{
    let actor = actor.into_inner();
    let filters = query.filters();
    let page = state.page_request(query.page(), query.per_page());

    debug!(
        actor = %actor,
        page = page.page,
        per_page = page.per_page,
        "Processing appointment list request"
    );

    let list = state
        .aggregator()
        .list_appointments(actor, filters, page)
        .await?;

    if list.report.is_partial() {
        warn!(
            actor = %actor,
            run_id = %list.report.run_id,
            failed = list.report.failed_tenants.len(),
            deadline_exceeded = list.report.deadline_exceeded,
            truncated = list.report.truncated,
            search_degraded = list.report.search_degraded,
            "Returning partial appointment list"
        );
    }

    let body = AppointmentsBody::new(&list, state.expose_partial_failures());
    Ok((StatusCode::OK, Json(body)).into_response())
}
