//! Cross-tenant appointment listing.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use super::aggregator::CrossTenantAggregator;
use super::task::{PassReport, TenantTask};
use crate::error::StorageResult;
use crate::identity::{CentralIdentity, IdentityCache};
use crate::query::{AppointmentFilters, AppointmentRow, TenantQueryExecutor};
use crate::tenant::{ActorRef, Tenant, TenantId};
use crate::types::{Page, PageRequest};

/// An appointment decorated with its tenant and counterpart identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedAppointment {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub appointment_id: i64,
    /// Start time in UTC.
    pub starts_at: DateTime<Utc>,
    /// Start time in the location's timezone, when the location has one.
    pub starts_at_local: Option<DateTime<FixedOffset>>,
    pub status: String,
    /// The other party of the appointment, `None` if it could not be resolved.
    pub counterpart: Option<CentralIdentity>,
    pub service_name: Option<String>,
    pub service_duration_minutes: Option<i64>,
    pub location_name: Option<String>,
}

/// A page of merged appointments with the pass report.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentList {
    #[serde(flatten)]
    pub page: Page<AggregatedAppointment>,
    pub filters: AppointmentFilters,
    #[serde(skip)]
    pub report: PassReport,
}

/// Lists one tenant's appointments for the actor.
pub struct AppointmentListing {
    filters: AppointmentFilters,
}

impl AppointmentListing {
    pub fn new(filters: AppointmentFilters) -> Self {
        Self { filters }
    }
}

#[async_trait]
impl<E: TenantQueryExecutor + ?Sized> TenantTask<E> for AppointmentListing {
    type Row = AppointmentRow;
    type Output = AggregatedAppointment;

    fn name(&self) -> &'static str {
        "appointments"
    }

    async fn query(
        &self,
        executor: &E,
        connection: &mut E::Connection,
        actor: &ActorRef,
        local_actor_id: i64,
    ) -> StorageResult<Vec<AppointmentRow>> {
        executor
            .query_appointments(connection, actor.actor_type, local_actor_id, &self.filters)
            .await
    }

    async fn decorate<'c>(
        &self,
        tenant: &Tenant,
        rows: Vec<AppointmentRow>,
        identities: &mut IdentityCache<'c>,
    ) -> StorageResult<Vec<AggregatedAppointment>> {
        identities
            .prefetch(rows.iter().filter_map(|r| r.counterpart_central_id))
            .await;

        let mut decorated = Vec::with_capacity(rows.len());
        for row in rows {
            let counterpart = match row.counterpart_central_id {
                Some(id) => identities.resolve(id).await,
                None => None,
            };
            decorated.push(AggregatedAppointment {
                tenant_id: tenant.id.clone(),
                tenant_name: tenant.name.clone(),
                appointment_id: row.id,
                starts_at: row.starts_at,
                starts_at_local: row.starts_at_local(),
                status: row.status,
                counterpart,
                service_name: row.service_name,
                service_duration_minutes: row.service_duration_minutes,
                location_name: row.location_name,
            });
        }
        Ok(decorated)
    }
}

impl<E: TenantQueryExecutor> CrossTenantAggregator<E> {
    /// Lists the actor's appointments across all linked tenants.
    ///
    /// Rows are merged, sorted by start time descending (ties keep tenant
    /// processing order, then per-tenant query order), capped at `max_rows`
    /// and paginated in memory.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::AccessDenied`](crate::error::AggregationError::AccessDenied)
    /// if the actor has no identity record, or a backend error if the
    /// registry cannot be reached before the loop. A failed identity search
    /// only marks the result partial.
    pub async fn list_appointments(
        &self,
        actor: ActorRef,
        mut filters: AppointmentFilters,
        page: PageRequest,
    ) -> StorageResult<AppointmentList> {
        let links = self.accepted_links(&actor).await?;

        let mut search_degraded = false;
        let search_text = filters.search_text.clone().filter(|_| filters.search_ids.is_none());
        if let Some(text) = search_text {
            let ids = match self.search_identity_ids(&actor, &text).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(
                        actor = %actor,
                        error = %e,
                        "Identity search failed, matching text fields only"
                    );
                    search_degraded = true;
                    BTreeSet::new()
                }
            };
            filters.search_ids = Some(ids);
        }

        let task = AppointmentListing::new(filters);
        let fan_out = self.fan_out(&actor, &links, &task).await;
        let mut rows = fan_out.rows;
        let mut report = fan_out.report;
        report.search_degraded = search_degraded;

        rows.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));
        if rows.len() > self.config().max_rows {
            tracing::warn!(
                rows = rows.len(),
                max_rows = self.config().max_rows,
                "Aggregated rows exceed limit, truncating"
            );
            rows.truncate(self.config().max_rows);
            report.truncated = true;
        }

        Ok(AppointmentList {
            page: Page::paginate(rows, page),
            filters: task.filters,
            report,
        })
    }

    /// Resolves a plaintext term to counterpart ids over the configured fields.
    async fn search_identity_ids(&self, actor: &ActorRef, text: &str) -> StorageResult<BTreeSet<i64>> {
        let counterpart = actor.actor_type.counterpart();
        let mut ids = BTreeSet::new();
        for field in &self.config().search_fields {
            let found = self
                .identities()
                .search_by_plaintext(counterpart, *field, text)
                .await?;
            ids.extend(found);
        }
        tracing::debug!(matches = ids.len(), "Resolved identity search term");
        Ok(ids)
    }
}
