//! Cross-tenant dashboard summary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregator::CrossTenantAggregator;
use super::task::{PassReport, TenantTask};
use crate::error::StorageResult;
use crate::identity::IdentityCache;
use crate::query::{AppointmentFilters, StatusCounts, TenantQueryExecutor};
use crate::tenant::{ActorRef, Tenant, TenantId};

/// Appointment counts of one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantSummary {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub counts: StatusCounts,
    /// Start of the actor's next appointment in this tenant.
    pub next_appointment: Option<DateTime<Utc>>,
}

/// Per-tenant counts and their totals.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub tenants: Vec<TenantSummary>,
    pub totals: StatusCounts,
    #[serde(skip)]
    pub report: PassReport,
}

/// Raw per-tenant numbers before decoration.
#[derive(Debug)]
pub struct TenantCounts {
    counts: StatusCounts,
    next_appointment: Option<DateTime<Utc>>,
}

/// Counts the actor's appointments by status in one tenant.
pub struct DashboardTask {
    now: DateTime<Utc>,
}

impl DashboardTask {
    /// `now` is the reference point for "next appointment".
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

#[async_trait]
impl<E: TenantQueryExecutor + ?Sized> TenantTask<E> for DashboardTask {
    type Row = TenantCounts;
    type Output = TenantSummary;

    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn query(
        &self,
        executor: &E,
        connection: &mut E::Connection,
        actor: &ActorRef,
        local_actor_id: i64,
    ) -> StorageResult<Vec<TenantCounts>> {
        let counts = executor
            .appointment_counts(
                connection,
                actor.actor_type,
                local_actor_id,
                &AppointmentFilters::default(),
            )
            .await?;
        let next_appointment = executor
            .next_appointment(connection, actor.actor_type, local_actor_id, self.now)
            .await?;
        Ok(vec![TenantCounts {
            counts,
            next_appointment,
        }])
    }

    async fn decorate<'c>(
        &self,
        tenant: &Tenant,
        rows: Vec<TenantCounts>,
        _identities: &mut IdentityCache<'c>,
    ) -> StorageResult<Vec<TenantSummary>> {
        Ok(rows
            .into_iter()
            .map(|row| TenantSummary {
                tenant_id: tenant.id.clone(),
                tenant_name: tenant.name.clone(),
                counts: row.counts,
                next_appointment: row.next_appointment,
            })
            .collect())
    }
}

impl<E: TenantQueryExecutor> CrossTenantAggregator<E> {
    /// Summarizes the actor's appointments per tenant.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::AccessDenied`](crate::error::AggregationError::AccessDenied)
    /// if the actor has no identity record.
    pub async fn dashboard(&self, actor: ActorRef, now: DateTime<Utc>) -> StorageResult<DashboardSummary> {
        let links = self.accepted_links(&actor).await?;
        let fan_out = self.fan_out(&actor, &links, &DashboardTask::new(now)).await;

        let mut totals = StatusCounts::new();
        for summary in &fan_out.rows {
            for (status, count) in &summary.counts {
                *totals.entry(status.clone()).or_default() += count;
            }
        }

        Ok(DashboardSummary {
            tenants: fan_out.rows,
            totals,
            report: fan_out.report,
        })
    }
}
