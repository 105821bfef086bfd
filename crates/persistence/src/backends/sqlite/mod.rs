//! SQLite backend implementation.
//!
//! Two kinds of databases are involved:
//!
//! - [`SqliteCentralStore`] - the central database with tenants, tenant links
//!   and identity records. Implements [`TenantRegistry`](crate::tenant::TenantRegistry),
//!   [`TenantAdministration`](crate::tenant::TenantAdministration) and
//!   [`CentralIdentityResolver`](crate::identity::CentralIdentityResolver).
//! - [`SqliteTenantDatabases`] - one database per tenant, located by the
//!   [`DatabasePerTenantStrategy`](crate::strategy::DatabasePerTenantStrategy).
//!   Implements [`TenantQueryExecutor`](crate::query::TenantQueryExecutor).
//!
//! Both support in-memory mode (great for testing) and file mode.
//!
//! # Example
//!
//! ```
//! use caregrid_persistence::backends::sqlite::{SqliteCentralStore, SqliteTenantDatabases};
//! use caregrid_persistence::identity::BlindIndexer;
//! use caregrid_persistence::tenant::Tenant;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let central = SqliteCentralStore::in_memory(BlindIndexer::new("key")?)?;
//! let tenants = SqliteTenantDatabases::in_memory()?;
//!
//! tenants.provision(&Tenant::new("northside", "Northside Physio"))?;
//! central.health_check()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! -- Central
//! CREATE TABLE tenants (id TEXT PRIMARY KEY, name TEXT, timezone TEXT, company_name TEXT, ...);
//! CREATE TABLE identities (actor_type TEXT, id INTEGER, first_name TEXT, ..., first_name_bidx TEXT, ...);
//! CREATE TABLE tenant_links (id INTEGER PRIMARY KEY, actor_type TEXT, actor_id INTEGER,
//!                            tenant_id TEXT, status TEXT, invited_at TEXT, responded_at TEXT);
//!
//! -- Per tenant
//! CREATE TABLE practitioners (id INTEGER PRIMARY KEY, central_practitioner_id INTEGER UNIQUE);
//! CREATE TABLE patients (id INTEGER PRIMARY KEY, central_patient_id INTEGER UNIQUE);
//! CREATE TABLE services (id INTEGER PRIMARY KEY, name TEXT, duration_minutes INTEGER);
//! CREATE TABLE locations (id INTEGER PRIMARY KEY, name TEXT, timezone TEXT, utc_offset_minutes INTEGER);
//! CREATE TABLE appointments (id INTEGER PRIMARY KEY, practitioner_id INTEGER, patient_id INTEGER,
//!                            service_id INTEGER, location_id INTEGER, starts_at TEXT, status TEXT);
//! ```
//!
//! Timestamps are stored as `YYYY-MM-DDTHH:MM:SSZ` text so that string order
//! is time order.

mod backend;
mod central;
mod schema;
mod tenant;

pub use backend::{SqliteBackendConfig, SqlitePool};
pub use central::SqliteCentralStore;
pub use schema::{CENTRAL_SCHEMA_VERSION, TENANT_SCHEMA_VERSION};
pub use tenant::{NewAppointment, SqliteConnection, SqliteTenantDatabases};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{BackendError, StorageResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| {
            BackendError::SerializationError {
                message: format!("invalid timestamp '{value}': {e}"),
            }
            .into()
        })
}
