//! Tenant-scoped queries.
//!
//! - [`AppointmentFilters`] - Status, date range and identity/text search filters
//! - [`AppointmentRow`] - A tenant-local appointment row
//! - [`TenantConnector`] - Opens and closes tenant database connections
//! - [`TenantQueryExecutor`] - Queries run against a bound tenant connection

mod executor;
mod filters;

pub use executor::{AppointmentRow, StatusCounts, TenantConnector, TenantQueryExecutor};
pub use filters::AppointmentFilters;
