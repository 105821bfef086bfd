//! Multitenancy strategy implementations.
//!
//! CareGrid isolates tenants physically: every practice has its own
//! database, and the central database only holds tenants, tenant links and
//! identity records. [`DatabasePerTenantStrategy`] maps tenant ids to
//! database locations and tracks open tenant pools.
//!
//! Considerations:
//! - Highest resource usage (connection pools per tenant)
//! - Cross-tenant reads cannot be expressed as one query; they go through
//!   the [`aggregate`](crate::aggregate) fan-out
//! - Best data isolation and portability
//!
//! # Example
//!
//! ```
//! use caregrid_persistence::strategy::{DatabasePerTenantConfig, DatabasePerTenantStrategy};
//! use caregrid_persistence::tenant::TenantId;
//!
//! let strategy = DatabasePerTenantStrategy::new(
//!     DatabasePerTenantConfig::default().with_max_pools(25),
//! )
//! .unwrap();
//!
//! assert!(strategy.validate(&TenantId::new("northside")).is_ok());
//! assert_eq!(strategy.database_name(&TenantId::new("northside")), "tenant_northside");
//! ```

mod database_per_tenant;

pub use database_per_tenant::{DatabasePerTenantConfig, DatabasePerTenantStrategy};
