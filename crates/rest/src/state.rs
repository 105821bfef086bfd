//! Application state for the CareGrid HTTP API.
//!
//! This module defines the shared application state that is available to all
//! request handlers: the cross-tenant aggregator, a health probe for the
//! backing databases, and the server configuration.

use std::sync::Arc;

use caregrid_persistence::aggregate::CrossTenantAggregator;
use caregrid_persistence::error::StorageResult;
use caregrid_persistence::query::TenantQueryExecutor;
use caregrid_persistence::types::PageRequest;

use crate::config::ServerConfig;

/// A backend that can report whether it is reachable.
pub trait HealthCheck: Send + Sync {
    /// Short name shown in health responses.
    fn backend_name(&self) -> &'static str;

    /// Returns `Ok` if the backend answers.
    fn check(&self) -> StorageResult<()>;
}

#[cfg(feature = "sqlite")]
impl HealthCheck for caregrid_persistence::backends::sqlite::SqliteCentralStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn check(&self) -> StorageResult<()> {
        self.health_check()
    }
}

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `E` - The tenant query executor behind the aggregator
///
/// # Example
///
/// ```rust,ignore
/// use caregrid_rest::{AppState, ServerConfig};
///
/// let state = AppState::new(aggregator, central.clone(), ServerConfig::default());
/// ```
pub struct AppState<E: TenantQueryExecutor> {
    /// The cross-tenant aggregator.
    aggregator: CrossTenantAggregator<E>,

    /// Probe for the central database.
    health: Arc<dyn HealthCheck>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since E is wrapped in Arc and doesn't need to be Clone
impl<E: TenantQueryExecutor> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            aggregator: self.aggregator.clone(),
            health: Arc::clone(&self.health),
            config: Arc::clone(&self.config),
        }
    }
}

impl<E: TenantQueryExecutor> AppState<E> {
    /// Creates a new AppState.
    pub fn new(
        aggregator: CrossTenantAggregator<E>,
        health: Arc<dyn HealthCheck>,
        config: ServerConfig,
    ) -> Self {
        Self {
            aggregator,
            health,
            config: Arc::new(config),
        }
    }

    /// Returns the aggregator.
    pub fn aggregator(&self) -> &CrossTenantAggregator<E> {
        &self.aggregator
    }

    /// Returns the central database probe.
    pub fn health(&self) -> &dyn HealthCheck {
        self.health.as_ref()
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns whether `partial` and `failed_tenants` are included in responses.
    pub fn expose_partial_failures(&self) -> bool {
        self.config.expose_partial_failures
    }

    /// Builds a page request from optional query values.
    ///
    /// Missing values fall back to page 1 and the default page size;
    /// `per_page` is clamped to `[1, max_per_page]`.
    pub fn page_request(&self, page: Option<usize>, per_page: Option<usize>) -> PageRequest {
        PageRequest::new(
            page.unwrap_or(1),
            per_page.unwrap_or(self.config.default_per_page),
        )
        .clamped(self.config.max_per_page)
    }
}
