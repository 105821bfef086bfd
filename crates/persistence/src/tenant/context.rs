//! Tenant context binding.
//!
//! [`TenantContext`] is the single slot that answers "which tenant database
//! am I bound to". It is owned by one aggregation pass and is never shared
//! between requests. While bound it owns the tenant connection, and
//! tenant-scoped queries can only get at that connection through
//! [`TenantContext::connection`], so a query cannot run unbound.

use std::fmt;

use serde::Serialize;

use super::id::TenantId;
use super::model::Tenant;
use crate::error::{StorageResult, TenantError};
use crate::query::TenantConnector;

/// Counters for `enter` and `exit` calls on one context.
///
/// An aggregation pass pairs every `enter` with exactly one `exit`, so after a
/// pass `enters == exits`, whatever happened in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContextStats {
    /// Number of `enter` calls, successful or not.
    pub enters: u64,
    /// Number of `exit` calls.
    pub exits: u64,
}

impl ContextStats {
    /// Returns `true` if every `enter` was matched by an `exit`.
    pub fn is_balanced(&self) -> bool {
        self.enters == self.exits
    }
}

struct Binding<Conn> {
    tenant: Tenant,
    connection: Conn,
}

/// A single-slot tenant binding.
///
/// `enter` and `exit` are not reentrant: entering while bound fails with
/// [`TenantError::ContextAlreadyActive`] and leaves the existing binding
/// untouched. `exit` never fails; teardown errors are logged and swallowed.
///
/// # Examples
///
/// ```ignore
/// let mut ctx = TenantContext::new(&databases);
///
/// ctx.enter(&tenant).await?;
/// let conn = ctx.connection()?;
/// let rows = databases.query_appointments(conn, actor_type, local_id, &filters).await?;
/// ctx.exit().await;
///
/// assert!(ctx.current().is_none());
/// ```
pub struct TenantContext<'a, C: TenantConnector + ?Sized> {
    connector: &'a C,
    binding: Option<Binding<C::Connection>>,
    stats: ContextStats,
}

impl<'a, C: TenantConnector + ?Sized> TenantContext<'a, C> {
    /// Creates an unbound context over `connector`.
    pub fn new(connector: &'a C) -> Self {
        Self {
            connector,
            binding: None,
            stats: ContextStats::default(),
        }
    }

    /// Binds this context to `tenant`'s database.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::ContextAlreadyActive`] if a tenant is already
    /// bound, or the connector's error if the tenant database cannot be opened.
    pub async fn enter(&mut self, tenant: &Tenant) -> StorageResult<()> {
        self.stats.enters += 1;

        if let Some(active) = &self.binding {
            return Err(TenantError::ContextAlreadyActive {
                active: active.tenant.id.clone(),
                requested: tenant.id.clone(),
            }
            .into());
        }

        let connection = self.connector.connect(tenant).await?;
        tracing::trace!(tenant = %tenant.id, "Entered tenant context");
        self.binding = Some(Binding {
            tenant: tenant.clone(),
            connection,
        });
        Ok(())
    }

    /// Unbinds the current tenant, if any.
    ///
    /// Safe to call when nothing is bound or when `enter` failed.
    pub async fn exit(&mut self) {
        self.stats.exits += 1;

        let Some(binding) = self.binding.take() else {
            return;
        };

        let tenant_id = binding.tenant.id.clone();
        if let Err(e) = self
            .connector
            .disconnect(&binding.tenant, binding.connection)
            .await
        {
            tracing::warn!(tenant = %tenant_id, error = %e, "Failed to release tenant context");
        } else {
            tracing::trace!(tenant = %tenant_id, "Exited tenant context");
        }
    }

    /// Returns the bound tenant.
    pub fn current(&self) -> Option<&Tenant> {
        self.binding.as_ref().map(|b| &b.tenant)
    }

    /// Returns the bound tenant's id.
    pub fn current_id(&self) -> Option<&TenantId> {
        self.current().map(|t| &t.id)
    }

    /// Returns the connection of the bound tenant.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::NoActiveContext`] if nothing is bound.
    pub fn connection(&mut self) -> Result<&mut C::Connection, TenantError> {
        self.binding
            .as_mut()
            .map(|b| &mut b.connection)
            .ok_or(TenantError::NoActiveContext)
    }

    /// Returns the enter/exit counters.
    pub fn stats(&self) -> ContextStats {
        self.stats
    }
}

impl<C: TenantConnector + ?Sized> fmt::Debug for TenantContext<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantContext")
            .field("current", &self.current_id())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<C: TenantConnector + ?Sized> Drop for TenantContext<'_, C> {
    fn drop(&mut self) {
        // The connection is released by dropping it; disconnect is async.
        if let Some(binding) = self.binding.take() {
            tracing::warn!(
                tenant = %binding.tenant.id,
                "Tenant context dropped while bound, releasing connection"
            );
        }
    }
}
