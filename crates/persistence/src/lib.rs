//! CareGrid Persistence Layer
//!
//! Data access for a multi-tenant practice-management system. Every practice
//! (tenant) owns an isolated database; a central database holds tenants,
//! tenant links and the identity records of practitioners and patients.
//!
//! The heart of the crate is cross-tenant aggregation: an actor linked to
//! several practices gets one merged, time-ordered view of their
//! appointments, built by visiting each tenant database in turn.
//!
//! # Architecture
//!
//! - [`tenant`] - Tenants, tenant links, the registry and the single-slot
//!   [`TenantContext`](tenant::TenantContext)
//! - [`identity`] - Central identities and blind-index search
//! - [`query`] - Tenant-scoped query traits and filters
//! - [`aggregate`] - The cross-tenant fan-out and its tasks
//! - [`strategy`] - Database-per-tenant layout and pool tracking
//! - [`backends`] - SQLite implementations
//! - [`types`] - Pagination
//! - [`error`] - Error types for all operations
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite with in-memory and file modes
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use caregrid_persistence::aggregate::{AggregationConfig, CrossTenantAggregator};
//! use caregrid_persistence::backends::sqlite::{SqliteCentralStore, SqliteTenantDatabases};
//! use caregrid_persistence::identity::BlindIndexer;
//! use caregrid_persistence::query::AppointmentFilters;
//! use caregrid_persistence::tenant::ActorRef;
//! use caregrid_persistence::types::PageRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let central = Arc::new(SqliteCentralStore::in_memory(BlindIndexer::new("key")?)?);
//! let tenants = Arc::new(SqliteTenantDatabases::in_memory()?);
//!
//! let aggregator = CrossTenantAggregator::new(
//!     central.clone(),
//!     central.clone(),
//!     tenants,
//!     AggregationConfig::default(),
//! );
//!
//! let list = aggregator
//!     .list_appointments(
//!         ActorRef::practitioner(1),
//!         AppointmentFilters::default(),
//!         PageRequest::default(),
//!     )
//!     .await?;
//!
//! println!("{} appointments", list.page.pagination.total);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod aggregate;
pub mod backends;
pub mod error;
pub mod identity;
pub mod query;
pub mod strategy;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use tenant::{ActorRef, ActorType, Tenant, TenantContext, TenantId};

pub use aggregate::{AggregationConfig, CrossTenantAggregator};
pub use identity::CentralIdentityResolver;
pub use query::{TenantConnector, TenantQueryExecutor};
pub use tenant::{TenantAdministration, TenantRegistry};

// Re-export tenancy strategy
pub use strategy::{DatabasePerTenantConfig, DatabasePerTenantStrategy};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
