//! Cross-tenant aggregation.
//!
//! An actor (practitioner or patient) can belong to many practices, each with
//! its own database. [`CrossTenantAggregator`] visits the actor's accepted
//! tenants one at a time, runs a [`TenantTask`] inside each, and merges the
//! results:
//!
//! 1. Resolve the actor's accepted links (no identity record: access denied)
//! 2. For each tenant: enter, resolve the local actor id, query, decorate, exit
//! 3. Merge, sort and paginate
//!
//! A failing tenant never fails the pass. It is logged, recorded in the
//! [`PassReport`] with the [`TenantStage`] it failed in, and skipped.
//!
//! Two tasks ship with the crate: [`AppointmentListing`] and [`DashboardTask`].

mod aggregator;
mod appointments;
mod config;
mod dashboard;
mod task;

pub use aggregator::{CrossTenantAggregator, FanOut, LinkedTenant};
pub use appointments::{AggregatedAppointment, AppointmentList, AppointmentListing};
pub use config::AggregationConfig;
pub use dashboard::{DashboardSummary, DashboardTask, TenantCounts, TenantSummary};
pub use task::{PassReport, TenantFailure, TenantStage, TenantTask};
