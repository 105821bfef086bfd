//! Tenant connection and query traits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::filters::AppointmentFilters;
use crate::error::StorageResult;
use crate::tenant::{ActorType, Tenant};

/// An appointment row as stored in one tenant's database.
///
/// The counterpart (the patient of a practitioner's appointment, or the
/// practitioner of a patient's appointment) is only known through the
/// tenant-local mirror row's pointer into the central database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRow {
    /// Tenant-local appointment id.
    pub id: i64,
    /// Start of the appointment.
    pub starts_at: DateTime<Utc>,
    /// Appointment status.
    pub status: String,
    /// Central id of the counterpart, read from the mirror row's `central_*_id`.
    pub counterpart_central_id: Option<i64>,
    /// Booked service name.
    pub service_name: Option<String>,
    /// Booked service duration.
    pub service_duration_minutes: Option<i64>,
    /// Location name.
    pub location_name: Option<String>,
    /// UTC offset of the location, in minutes, when the location has a timezone.
    pub location_utc_offset_minutes: Option<i32>,
}

impl AppointmentRow {
    /// Returns the start time in the location's timezone, if known.
    pub fn starts_at_local(&self) -> Option<DateTime<FixedOffset>> {
        let minutes = self.location_utc_offset_minutes?;
        let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
        Some(self.starts_at.with_timezone(&offset))
    }
}

/// Appointment counts for one tenant, keyed by status.
pub type StatusCounts = BTreeMap<String, u64>;

/// Opens and closes connections to tenant databases.
///
/// A connection is only ever handed out through a bound
/// [`TenantContext`](crate::tenant::TenantContext).
#[async_trait]
pub trait TenantConnector: Send + Sync {
    /// Connection handle bound to one tenant's database.
    type Connection: Send + 'static;

    /// Opens a connection to the tenant's database.
    async fn connect(&self, tenant: &Tenant) -> StorageResult<Self::Connection>;

    /// Releases a connection.
    async fn disconnect(&self, tenant: &Tenant, connection: Self::Connection) -> StorageResult<()>;
}

/// Tenant-scoped queries.
///
/// Every method takes the connection of the tenant context that is currently
/// bound; there is no way to call them without entering a tenant first.
#[async_trait]
pub trait TenantQueryExecutor: TenantConnector {
    /// Resolves the tenant-local id of a central actor through its mirror row.
    ///
    /// Returns `None` when the actor has no mirror row in this tenant yet.
    async fn resolve_local_actor(
        &self,
        connection: &mut Self::Connection,
        actor_type: ActorType,
        central_id: i64,
    ) -> StorageResult<Option<i64>>;

    /// Returns the actor's appointments matching `filters`, in the tenant's
    /// natural order (start time descending, then id).
    async fn query_appointments(
        &self,
        connection: &mut Self::Connection,
        actor_type: ActorType,
        local_actor_id: i64,
        filters: &AppointmentFilters,
    ) -> StorageResult<Vec<AppointmentRow>>;

    /// Counts the actor's appointments matching `filters`, by status.
    async fn appointment_counts(
        &self,
        connection: &mut Self::Connection,
        actor_type: ActorType,
        local_actor_id: i64,
        filters: &AppointmentFilters,
    ) -> StorageResult<StatusCounts>;

    /// Returns the start of the actor's next appointment at or after `after`.
    async fn next_appointment(
        &self,
        connection: &mut Self::Connection,
        actor_type: ActorType,
        local_actor_id: i64,
        after: DateTime<Utc>,
    ) -> StorageResult<Option<DateTime<Utc>>>;
}
