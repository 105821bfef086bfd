//! HTTP request handlers.
//!
//! - [`appointments`] - Merged appointment list across the actor's tenants
//! - [`dashboard`] - Per-tenant appointment counts
//! - [`tenants`] - The actor's linked tenants
//! - [`health`] - Health check endpoints

pub mod appointments;
pub mod dashboard;
pub mod health;
pub mod tenants;

// Re-export handlers for convenience
pub use appointments::appointments_handler;
pub use dashboard::dashboard_handler;
pub use health::{health_handler, liveness_handler};
pub use tenants::tenants_handler;
