//! Tenants, tenant links and the tenant context binding.
//!
//! # Core Types
//!
//! - [`TenantId`] - Opaque tenant identifier
//! - [`Tenant`] - A practice with its display name and metadata
//! - [`TenantLink`] - Practitioner/patient membership in a tenant, with an
//!   invitation status
//! - [`TenantContext`] - Single-slot binding to one tenant database
//! - [`TenantRegistry`] - Resolves an actor's accepted tenant links
//!
//! # Binding Discipline
//!
//! Every tenant database access goes through a [`TenantContext`]. A context
//! holds at most one tenant at a time; `enter` while bound fails with
//! `ContextAlreadyActive`, and `exit` is always safe to call.
//!
//! ```
//! use caregrid_persistence::tenant::{LinkStatus, Tenant};
//!
//! let tenant = Tenant::new("northside", "Northside Physio")
//!     .with_timezone("Europe/Dublin");
//!
//! assert_eq!(tenant.id.as_str(), "northside");
//! assert!(LinkStatus::Pending.can_transition_to(LinkStatus::Accepted));
//! assert!(!LinkStatus::Accepted.can_transition_to(LinkStatus::Rejected));
//! ```

mod context;
mod id;
mod model;
mod registry;

pub use context::{ContextStats, TenantContext};
pub use id::{ActorType, TenantId};
pub use model::{LinkStatus, Tenant, TenantLink, TenantMetadata};
pub use registry::{ActorRef, TenantAdministration, TenantRegistry};
