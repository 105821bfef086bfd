//! Tenant registry traits.
//!
//! The registry lives in the central database. It answers "which tenants is
//! this actor linked to" and "what do we know about this tenant", and it owns
//! the invitation lifecycle of tenant links.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::id::{ActorType, TenantId};
use super::model::{LinkStatus, Tenant, TenantLink};
use crate::error::StorageResult;

/// A reference to a central actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    /// Practitioner or patient.
    pub actor_type: ActorType,
    /// Central id of the actor.
    pub id: i64,
}

impl ActorRef {
    /// Creates a practitioner reference.
    pub fn practitioner(id: i64) -> Self {
        Self {
            actor_type: ActorType::Practitioner,
            id,
        }
    }

    /// Creates a patient reference.
    pub fn patient(id: i64) -> Self {
        Self {
            actor_type: ActorType::Patient,
            id,
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.actor_type, self.id)
    }
}

/// Read access to tenants and tenant links.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Returns the accepted tenant links of an actor.
    ///
    /// The order of the returned links is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`TenantError::ActorNotFound`](crate::error::TenantError::ActorNotFound)
    /// if the actor has no identity record. An actor without links gets an
    /// empty vector.
    async fn linked_tenants(
        &self,
        actor_id: i64,
        actor_type: ActorType,
    ) -> StorageResult<Vec<TenantLink>>;

    /// Looks up a tenant record.
    async fn tenant(&self, tenant_id: &TenantId) -> StorageResult<Option<Tenant>>;
}

/// Write access to tenants and the invitation lifecycle.
#[async_trait]
pub trait TenantAdministration: TenantRegistry {
    /// Registers a tenant, replacing its name and metadata if it already exists.
    async fn register_tenant(&self, tenant: &Tenant) -> StorageResult<()>;

    /// Invites an actor to a tenant, creating a pending link.
    async fn invite(&self, actor: ActorRef, tenant_id: &TenantId) -> StorageResult<TenantLink>;

    /// Answers a pending invitation.
    async fn respond(&self, link_id: i64, status: LinkStatus) -> StorageResult<TenantLink>;
}
