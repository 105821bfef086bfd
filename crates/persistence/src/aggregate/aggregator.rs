//! The cross-tenant fan-out.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::config::AggregationConfig;
use super::task::{PassReport, TenantStage, TenantTask};
use crate::error::{AggregationError, StorageError, StorageResult, TenantError};
use crate::identity::{CentralIdentityResolver, IdentityCache};
use crate::query::TenantQueryExecutor;
use crate::tenant::{ActorRef, Tenant, TenantContext, TenantLink, TenantRegistry};

/// Rows collected by one fan-out, in tenant processing order.
#[derive(Debug)]
pub struct FanOut<T> {
    pub rows: Vec<T>,
    pub report: PassReport,
}

/// A tenant the actor is linked to, with its link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedTenant {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub link_id: i64,
    pub accepted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Runs tenant tasks across every tenant an actor is linked to.
///
/// Tenants are visited one at a time through a [`TenantContext`] owned by the
/// pass. Every `enter` is paired with exactly one `exit` no matter how the
/// visit ends. A failing tenant is logged, recorded in the pass report and
/// skipped; only an actor without an identity record fails the whole pass.
pub struct CrossTenantAggregator<E: TenantQueryExecutor> {
    registry: Arc<dyn TenantRegistry>,
    identities: Arc<dyn CentralIdentityResolver>,
    executor: Arc<E>,
    config: AggregationConfig,
}

impl<E: TenantQueryExecutor> Clone for CrossTenantAggregator<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            identities: Arc::clone(&self.identities),
            executor: Arc::clone(&self.executor),
            config: self.config.clone(),
        }
    }
}

impl<E: TenantQueryExecutor> CrossTenantAggregator<E> {
    /// Creates an aggregator.
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        identities: Arc<dyn CentralIdentityResolver>,
        executor: Arc<E>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            registry,
            identities,
            executor,
            config,
        }
    }

    /// Returns the aggregation limits.
    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Returns the tenant executor.
    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Returns the identity resolver.
    pub fn identities(&self) -> &Arc<dyn CentralIdentityResolver> {
        &self.identities
    }

    /// Resolves the actor's accepted tenant links.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::AccessDenied`] if the actor has no
    /// identity record.
    pub async fn accepted_links(&self, actor: &ActorRef) -> StorageResult<Vec<TenantLink>> {
        match self.registry.linked_tenants(actor.id, actor.actor_type).await {
            Ok(links) => Ok(links.into_iter().filter(TenantLink::is_accepted).collect()),
            Err(StorageError::Tenant(TenantError::ActorNotFound { actor_type, actor_id })) => {
                tracing::info!(actor = %actor, "Access denied, no identity record");
                Err(AggregationError::AccessDenied {
                    actor_type,
                    actor_id,
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the tenants the actor is linked to.
    ///
    /// Links whose tenant record is missing are left out.
    pub async fn linked_tenants(&self, actor: &ActorRef) -> StorageResult<Vec<LinkedTenant>> {
        let links = self.accepted_links(actor).await?;
        let mut tenants = Vec::with_capacity(links.len());
        for link in links {
            match self.registry.tenant(&link.tenant_id).await? {
                Some(tenant) => tenants.push(LinkedTenant {
                    tenant,
                    link_id: link.id,
                    accepted_at: link.responded_at,
                }),
                None => {
                    tracing::warn!(tenant = %link.tenant_id, link_id = link.id, "Linked tenant has no tenant record");
                }
            }
        }
        Ok(tenants)
    }

    /// Runs `task` in every tenant of `links`.
    ///
    /// Never fails: per-tenant errors end up in the report.
    pub async fn fan_out<T>(&self, actor: &ActorRef, links: &[TenantLink], task: &T) -> FanOut<T::Output>
    where
        T: TenantTask<E>,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "aggregation",
            run_id = %run_id,
            actor = %actor,
            task = task.name(),
        );
        self.fan_out_inner(run_id, actor, links, task)
            .instrument(span)
            .await
    }

    async fn fan_out_inner<T>(
        &self,
        run_id: Uuid,
        actor: &ActorRef,
        links: &[TenantLink],
        task: &T,
    ) -> FanOut<T::Output>
    where
        T: TenantTask<E>,
    {
        let started = Instant::now();
        let deadline = self.config.deadline.map(|d| started + d);
        let mut report = PassReport::new(run_id);
        let mut rows = Vec::new();
        let mut ctx = TenantContext::new(self.executor.as_ref());
        let mut identities = IdentityCache::new(self.identities.as_ref(), actor.actor_type.counterpart());

        let mut seen = HashSet::new();
        let tenant_ids: Vec<_> = links
            .iter()
            .filter(|l| seen.insert(l.tenant_id.clone()))
            .map(|l| l.tenant_id.clone())
            .collect();

        tracing::debug!(tenants = tenant_ids.len(), "Starting tenant fan-out");

        for (index, tenant_id) in tenant_ids.iter().enumerate() {
            if index >= self.config.max_tenants {
                tracing::warn!(tenant = %tenant_id, max_tenants = self.config.max_tenants, "Tenant limit reached, skipping");
                report.record(
                    tenant_id,
                    TenantStage::Skipped,
                    format!("tenant limit of {} reached", self.config.max_tenants),
                );
                continue;
            }

            if report.deadline_exceeded || deadline.is_some_and(|d| Instant::now() >= d) {
                report.deadline_exceeded = true;
                report.record(tenant_id, TenantStage::Skipped, "aggregation deadline exceeded");
                continue;
            }

            let tenant = match self.registry.tenant(tenant_id).await {
                Ok(Some(tenant)) => tenant,
                Ok(None) => {
                    let e = TenantError::TenantNotFound {
                        tenant_id: tenant_id.clone(),
                    };
                    tracing::warn!(tenant = %tenant_id, error = %e, "Skipping linked tenant");
                    report.record(tenant_id, TenantStage::Resolving, e.to_string());
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tenant = %tenant_id, error = %e, "Tenant lookup failed, skipping");
                    report.record(tenant_id, TenantStage::Resolving, e.to_string());
                    continue;
                }
            };

            let mut stage = TenantStage::Entering;
            let visit = self.visit(&mut ctx, task, &tenant, actor, &mut identities, &mut stage);
            // Only fires if the visit yields; blocking executors are caught by
            // the check at the top of the loop.
            let outcome = match deadline {
                Some(d) => match tokio::time::timeout_at(d, visit).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        report.deadline_exceeded = true;
                        Err(AggregationError::TenantQueryFailure {
                            tenant_id: tenant.id.clone(),
                            message: "aggregation deadline exceeded".to_string(),
                        }
                        .into())
                    }
                },
                None => visit.await,
            };

            ctx.exit().await;

            match outcome {
                Ok(mut tenant_rows) => {
                    tracing::debug!(tenant = %tenant.id, rows = tenant_rows.len(), "Tenant visit complete");
                    report.tenants_visited += 1;
                    rows.append(&mut tenant_rows);
                }
                Err(e) => {
                    let failure = match e {
                        StorageError::Aggregation(AggregationError::TenantQueryFailure { .. }) => e,
                        other => AggregationError::TenantQueryFailure {
                            tenant_id: tenant.id.clone(),
                            message: other.to_string(),
                        }
                        .into(),
                    };
                    tracing::warn!(tenant = %tenant.id, stage = %stage, error = %failure, "Tenant visit failed, continuing");
                    report.record(&tenant.id, stage, failure.to_string());
                }
            }
        }

        report.context = ctx.stats();
        tracing::debug!(
            rows = rows.len(),
            visited = report.tenants_visited,
            failed = report.failed_tenants.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tenant fan-out finished"
        );

        FanOut { rows, report }
    }

    /// One tenant visit, up to but not including `exit`.
    async fn visit<T>(
        &self,
        ctx: &mut TenantContext<'_, E>,
        task: &T,
        tenant: &Tenant,
        actor: &ActorRef,
        identities: &mut IdentityCache<'_>,
        stage: &mut TenantStage,
    ) -> StorageResult<Vec<T::Output>>
    where
        T: TenantTask<E>,
    {
        *stage = TenantStage::Entering;
        ctx.enter(tenant).await?;

        *stage = TenantStage::Querying;
        let local_id = self
            .executor
            .resolve_local_actor(ctx.connection()?, actor.actor_type, actor.id)
            .await?;
        let Some(local_id) = local_id else {
            tracing::debug!(tenant = %tenant.id, "Actor has no local record in tenant");
            return Ok(Vec::new());
        };

        let tenant_rows = task
            .query(self.executor.as_ref(), ctx.connection()?, actor, local_id)
            .await?;

        *stage = TenantStage::Decorating;
        task.decorate(tenant, tenant_rows, identities).await
    }
}
