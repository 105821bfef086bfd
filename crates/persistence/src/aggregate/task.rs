//! Per-tenant tasks and their outcome.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::StorageResult;
use crate::identity::IdentityCache;
use crate::query::TenantQueryExecutor;
use crate::tenant::{ActorRef, ContextStats, Tenant, TenantId};

/// Where a tenant was in its visit when something went wrong.
///
/// A visit moves `Resolving -> Entering -> Querying -> Decorating -> Exited`.
/// A failure at any stage still ends in `Exited`; the stage recorded in a
/// [`TenantFailure`] is the one that was active when it happened. `Skipped`
/// tenants were never entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStage {
    Resolving,
    Entering,
    Querying,
    Decorating,
    Exited,
    Skipped,
}

impl TenantStage {
    /// Returns the stage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStage::Resolving => "resolving",
            TenantStage::Entering => "entering",
            TenantStage::Querying => "querying",
            TenantStage::Decorating => "decorating",
            TenantStage::Exited => "exited",
            TenantStage::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TenantStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tenant that did not contribute (all of) its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantFailure {
    pub tenant_id: TenantId,
    pub stage: TenantStage,
    pub message: String,
}

/// Bookkeeping of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Correlation id, also recorded on the pass's tracing span.
    pub run_id: Uuid,
    /// Tenants whose visit completed without error.
    pub tenants_visited: usize,
    /// Tenants that failed or were skipped.
    pub failed_tenants: Vec<TenantFailure>,
    /// The loop stopped early because the deadline passed.
    pub deadline_exceeded: bool,
    /// Rows beyond the row cap were dropped.
    pub truncated: bool,
    /// The identity search failed and only text fields were matched.
    pub search_degraded: bool,
    /// Enter/exit counters of the pass's tenant context.
    pub context: ContextStats,
}

impl PassReport {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            tenants_visited: 0,
            failed_tenants: Vec::new(),
            deadline_exceeded: false,
            truncated: false,
            search_degraded: false,
            context: ContextStats::default(),
        }
    }

    /// Returns `true` if the result may be missing rows.
    pub fn is_partial(&self) -> bool {
        !self.failed_tenants.is_empty()
            || self.deadline_exceeded
            || self.truncated
            || self.search_degraded
    }

    pub(crate) fn record(&mut self, tenant_id: &TenantId, stage: TenantStage, message: impl Into<String>) {
        self.failed_tenants.push(TenantFailure {
            tenant_id: tenant_id.clone(),
            stage,
            message: message.into(),
        });
    }
}

/// The work done inside one bound tenant.
///
/// `query` runs while the tenant context is bound and only sees the
/// tenant's connection. `decorate` correlates the tenant-local rows with
/// central identities and tenant metadata; it also runs before the context
/// is exited, so the row and the bound tenant always agree.
#[async_trait]
pub trait TenantTask<E: TenantQueryExecutor + ?Sized>: Send + Sync {
    /// Tenant-local row produced by `query`.
    type Row: Send + 'static;
    /// Decorated row accumulated across tenants.
    type Output: Send + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the tenant-scoped query for the actor's local id.
    async fn query(
        &self,
        executor: &E,
        connection: &mut E::Connection,
        actor: &ActorRef,
        local_actor_id: i64,
    ) -> StorageResult<Vec<Self::Row>>;

    /// Turns tenant rows into output rows.
    async fn decorate<'c>(
        &self,
        tenant: &Tenant,
        rows: Vec<Self::Row>,
        identities: &mut IdentityCache<'c>,
    ) -> StorageResult<Vec<Self::Output>>;
}
