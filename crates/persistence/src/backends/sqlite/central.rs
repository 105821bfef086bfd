//! Central store: tenants, tenant links and identities.

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use super::backend::{DatabaseLocation, SqliteBackendConfig, SqlitePool, build_pool, ping};
use super::{format_timestamp, parse_timestamp, schema};
use crate::error::{BackendError, StorageError, StorageResult, TenantError};
use crate::identity::{BlindIndexer, CentralIdentity, CentralIdentityResolver, IdentityField};
use crate::tenant::{
    ActorRef, ActorType, LinkStatus, Tenant, TenantAdministration, TenantId, TenantLink,
    TenantMetadata, TenantRegistry,
};

const LINK_COLUMNS: &str = "id, actor_type, actor_id, tenant_id, status, invited_at, responded_at";

/// The central database.
///
/// Holds its own pool, separate from any tenant database, so lookups made
/// while a tenant is bound never touch the tenant binding.
pub struct SqliteCentralStore {
    pool: SqlitePool,
    indexer: BlindIndexer,
    is_memory: bool,
}

impl Debug for SqliteCentralStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCentralStore")
            .field("is_memory", &self.is_memory)
            .field("pool_size", &self.pool.state().connections)
            .finish_non_exhaustive()
    }
}

impl SqliteCentralStore {
    /// Creates an in-memory central store.
    pub fn in_memory(indexer: BlindIndexer) -> StorageResult<Self> {
        let pool = build_pool(DatabaseLocation::Memory, &SqliteBackendConfig::default(), 1)?;
        Self::init(pool, indexer, true)
    }

    /// Opens or creates a central database file.
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: &SqliteBackendConfig,
        indexer: BlindIndexer,
    ) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(BackendError::from)?;
        }
        let pool = build_pool(
            DatabaseLocation::File(path.as_ref()),
            config,
            config.max_connections,
        )?;
        Self::init(pool, indexer, false)
    }

    fn init(pool: SqlitePool, indexer: BlindIndexer, is_memory: bool) -> StorageResult<Self> {
        schema::initialize_central_schema(&*pool.get()?)?;
        tracing::debug!(is_memory, "Central store ready");
        Ok(Self {
            pool,
            indexer,
            is_memory,
        })
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Checks that the central database answers.
    pub fn health_check(&self) -> StorageResult<()> {
        ping(&self.pool)
    }

    /// Inserts or replaces an identity record and its blind indexes.
    pub fn register_identity(&self, identity: &CentralIdentity) -> StorageResult<()> {
        let bidx = |field: IdentityField| identity.field(field).map(|v| self.indexer.index(field, v));
        self.pool.get()?.execute(
            "INSERT OR REPLACE INTO identities (
                actor_type, id, first_name, last_name, email, phone,
                first_name_bidx, last_name_bidx, email_bidx, phone_bidx
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                identity.actor_type.as_str(),
                identity.id,
                identity.first_name,
                identity.last_name,
                identity.email,
                identity.phone,
                bidx(IdentityField::FirstName),
                bidx(IdentityField::LastName),
                bidx(IdentityField::Email),
                bidx(IdentityField::Phone),
            ],
        )?;
        Ok(())
    }

    fn identity_exists(&self, actor_type: ActorType, id: i64) -> StorageResult<bool> {
        let found = self
            .pool
            .get()?
            .query_row(
                "SELECT 1 FROM identities WHERE actor_type = ?1 AND id = ?2",
                params![actor_type.as_str(), id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn load_link(&self, link_id: i64) -> StorageResult<Option<TenantLink>> {
        let raw = self
            .pool
            .get()?
            .query_row(
                &format!("SELECT {LINK_COLUMNS} FROM tenant_links WHERE id = ?1"),
                [link_id],
                RawLink::from_row,
            )
            .optional()?;
        raw.map(RawLink::into_link).transpose()
    }

    fn store_link(&self, link: &TenantLink) -> StorageResult<()> {
        self.pool.get()?.execute(
            "UPDATE tenant_links SET status = ?1, invited_at = ?2, responded_at = ?3 WHERE id = ?4",
            params![
                link.status.as_str(),
                format_timestamp(&link.invited_at),
                link.responded_at.as_ref().map(format_timestamp),
                link.id,
            ],
        )?;
        Ok(())
    }
}

/// A tenant link row before its text columns are parsed.
struct RawLink {
    id: i64,
    actor_type: String,
    actor_id: i64,
    tenant_id: String,
    status: String,
    invited_at: String,
    responded_at: Option<String>,
}

impl RawLink {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            actor_type: row.get(1)?,
            actor_id: row.get(2)?,
            tenant_id: row.get(3)?,
            status: row.get(4)?,
            invited_at: row.get(5)?,
            responded_at: row.get(6)?,
        })
    }

    fn into_link(self) -> StorageResult<TenantLink> {
        Ok(TenantLink {
            id: self.id,
            actor_type: self.actor_type.parse()?,
            actor_id: self.actor_id,
            tenant_id: TenantId::new(self.tenant_id),
            status: self.status.parse()?,
            invited_at: parse_timestamp(&self.invited_at)?,
            responded_at: self.responded_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn identity_from_row(actor_type: ActorType, row: &Row<'_>) -> rusqlite::Result<CentralIdentity> {
    Ok(CentralIdentity {
        id: row.get(0)?,
        actor_type,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
    })
}

#[async_trait]
impl TenantRegistry for SqliteCentralStore {
    async fn linked_tenants(
        &self,
        actor_id: i64,
        actor_type: ActorType,
    ) -> StorageResult<Vec<TenantLink>> {
        if !self.identity_exists(actor_type, actor_id)? {
            return Err(TenantError::ActorNotFound {
                actor_type,
                actor_id,
            }
            .into());
        }

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LINK_COLUMNS} FROM tenant_links
             WHERE actor_type = ?1 AND actor_id = ?2 AND status = ?3
             ORDER BY id"
        ))?;
        let raw = stmt
            .query_map(
                params![actor_type.as_str(), actor_id, LinkStatus::Accepted.as_str()],
                RawLink::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter().map(RawLink::into_link).collect()
    }

    async fn tenant(&self, tenant_id: &TenantId) -> StorageResult<Option<Tenant>> {
        let tenant = self
            .pool
            .get()?
            .query_row(
                "SELECT id, name, timezone, company_name FROM tenants WHERE id = ?1",
                [tenant_id.as_str()],
                |row| {
                    Ok(Tenant {
                        id: TenantId::new(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        metadata: TenantMetadata {
                            timezone: row.get(2)?,
                            company_name: row.get(3)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(tenant)
    }
}

#[async_trait]
impl TenantAdministration for SqliteCentralStore {
    async fn register_tenant(&self, tenant: &Tenant) -> StorageResult<()> {
        self.pool.get()?.execute(
            "INSERT INTO tenants (id, name, timezone, company_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                timezone = excluded.timezone,
                company_name = excluded.company_name",
            params![
                tenant.id.as_str(),
                tenant.name,
                tenant.metadata.timezone,
                tenant.metadata.company_name,
                format_timestamp(&Utc::now()),
            ],
        )?;
        tracing::info!(tenant = %tenant.id, "Registered tenant");
        Ok(())
    }

    /// Creates a pending link.
    ///
    /// An existing pending or accepted link is returned unchanged; a rejected
    /// or expired one is reopened as a new pending invitation.
    async fn invite(&self, actor: ActorRef, tenant_id: &TenantId) -> StorageResult<TenantLink> {
        if !self.identity_exists(actor.actor_type, actor.id)? {
            return Err(TenantError::ActorNotFound {
                actor_type: actor.actor_type,
                actor_id: actor.id,
            }
            .into());
        }
        if self.tenant(tenant_id).await?.is_none() {
            return Err(TenantError::TenantNotFound {
                tenant_id: tenant_id.clone(),
            }
            .into());
        }

        let now = Utc::now();
        let existing = {
            let conn = self.pool.get()?;
            conn.query_row(
                &format!(
                    "SELECT {LINK_COLUMNS} FROM tenant_links
                     WHERE actor_type = ?1 AND actor_id = ?2 AND tenant_id = ?3"
                ),
                params![actor.actor_type.as_str(), actor.id, tenant_id.as_str()],
                RawLink::from_row,
            )
            .optional()?
        };

        if let Some(raw) = existing {
            let mut link = raw.into_link()?;
            if matches!(link.status, LinkStatus::Pending | LinkStatus::Accepted) {
                return Ok(link);
            }
            link.status = LinkStatus::Pending;
            link.invited_at = now;
            link.responded_at = None;
            self.store_link(&link)?;
            tracing::info!(actor = %actor, tenant = %tenant_id, link_id = link.id, "Reopened tenant invitation");
            return Ok(link);
        }

        let id = {
            let conn = self.pool.get()?;
            conn.execute(
                "INSERT INTO tenant_links (actor_type, actor_id, tenant_id, status, invited_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    actor.actor_type.as_str(),
                    actor.id,
                    tenant_id.as_str(),
                    LinkStatus::Pending.as_str(),
                    format_timestamp(&now),
                ],
            )?;
            conn.last_insert_rowid()
        };

        tracing::info!(actor = %actor, tenant = %tenant_id, link_id = id, "Created tenant invitation");
        self.load_link(id)?.ok_or_else(|| {
            StorageError::Backend(BackendError::QueryError {
                message: format!("tenant link {id} vanished after insert"),
            })
        })
    }

    async fn respond(&self, link_id: i64, status: LinkStatus) -> StorageResult<TenantLink> {
        let mut link = self
            .load_link(link_id)?
            .ok_or(TenantError::LinkNotFound { link_id })?;
        link.transition(status, Utc::now())?;
        self.store_link(&link)?;
        tracing::info!(link_id, status = %status, tenant = %link.tenant_id, "Tenant link updated");
        Ok(link)
    }
}

#[async_trait]
impl CentralIdentityResolver for SqliteCentralStore {
    async fn find_by_id(
        &self,
        actor_type: ActorType,
        id: i64,
    ) -> StorageResult<Option<CentralIdentity>> {
        let identity = self
            .pool
            .get()?
            .query_row(
                "SELECT id, first_name, last_name, email, phone FROM identities
                 WHERE actor_type = ?1 AND id = ?2",
                params![actor_type.as_str(), id],
                |row| identity_from_row(actor_type, row),
            )
            .optional()?;
        Ok(identity)
    }

    async fn find_by_ids(
        &self,
        actor_type: ActorType,
        ids: &[i64],
    ) -> StorageResult<Vec<CentralIdentity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, first_name, last_name, email, phone FROM identities
             WHERE actor_type = ? AND id IN ({placeholders})
             ORDER BY id"
        );

        let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(ids.len() + 1);
        values.push(actor_type.as_str().to_string().into());
        values.extend(ids.iter().map(|id| rusqlite::types::Value::from(*id)));

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let identities = stmt
            .query_map(rusqlite::params_from_iter(values), |row| {
                identity_from_row(actor_type, row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(identities)
    }

    async fn search_by_plaintext(
        &self,
        actor_type: ActorType,
        field: IdentityField,
        value: &str,
    ) -> StorageResult<Vec<i64>> {
        let index = self.indexer.index(field, value);
        let sql = format!(
            "SELECT id FROM identities WHERE actor_type = ?1 AND {}_bidx = ?2 ORDER BY id",
            field.as_str()
        );

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![actor_type.as_str(), index], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;

    fn store() -> SqliteCentralStore {
        SqliteCentralStore::in_memory(BlindIndexer::new("test-key").unwrap()).unwrap()
    }

    fn practitioner(id: i64) -> CentralIdentity {
        CentralIdentity::new(ActorType::Practitioner, id)
            .with_name("Grace", "Hopper")
            .with_email("grace@example.com")
    }

    #[tokio::test]
    async fn test_linked_tenants_unknown_actor() {
        let store = store();
        let err = store
            .linked_tenants(42, ActorType::Practitioner)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::ActorNotFound { actor_id: 42, .. })
        ));
    }

    #[tokio::test]
    async fn test_linked_tenants_no_links_is_empty() {
        let store = store();
        store.register_identity(&practitioner(1)).unwrap();
        assert!(store
            .linked_tenants(1, ActorType::Practitioner)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invitation_lifecycle() {
        let store = store();
        store.register_identity(&practitioner(1)).unwrap();
        store
            .register_tenant(&Tenant::new("clinic_a", "Clinic A"))
            .await
            .unwrap();
        store
            .register_tenant(&Tenant::new("clinic_b", "Clinic B"))
            .await
            .unwrap();

        let a = store
            .invite(ActorRef::practitioner(1), &TenantId::new("clinic_a"))
            .await
            .unwrap();
        let b = store
            .invite(ActorRef::practitioner(1), &TenantId::new("clinic_b"))
            .await
            .unwrap();
        assert_eq!(a.status, LinkStatus::Pending);

        // Pending links do not participate.
        assert!(store
            .linked_tenants(1, ActorType::Practitioner)
            .await
            .unwrap()
            .is_empty());

        let accepted = store.respond(a.id, LinkStatus::Accepted).await.unwrap();
        assert!(accepted.responded_at.is_some());
        store.respond(b.id, LinkStatus::Rejected).await.unwrap();

        let links = store.linked_tenants(1, ActorType::Practitioner).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].tenant_id.as_str(), "clinic_a");

        let err = store.respond(a.id, LinkStatus::Expired).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::InvalidLinkTransition { .. })
        ));

        let reopened = store
            .invite(ActorRef::practitioner(1), &TenantId::new("clinic_b"))
            .await
            .unwrap();
        assert_eq!(reopened.id, b.id);
        assert_eq!(reopened.status, LinkStatus::Pending);
    }

    #[tokio::test]
    async fn test_invite_unknown_tenant() {
        let store = store();
        store.register_identity(&practitioner(1)).unwrap();
        let err = store
            .invite(ActorRef::practitioner(1), &TenantId::new("nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::TenantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_respond_unknown_link() {
        let err = store().respond(99, LinkStatus::Accepted).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::LinkNotFound { link_id: 99 })
        ));
    }

    #[tokio::test]
    async fn test_tenant_lookup() {
        let store = store();
        store
            .register_tenant(
                &Tenant::new("clinic_a", "Clinic A")
                    .with_timezone("Europe/Dublin")
                    .with_company_name("Clinic A Ltd"),
            )
            .await
            .unwrap();

        let tenant = store.tenant(&TenantId::new("clinic_a")).await.unwrap().unwrap();
        assert_eq!(tenant.name, "Clinic A");
        assert_eq!(tenant.metadata.timezone.as_deref(), Some("Europe/Dublin"));
        assert!(store.tenant(&TenantId::new("clinic_z")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_identity_lookup_and_blind_search() {
        let store = store();
        store.register_identity(&practitioner(1)).unwrap();
        store
            .register_identity(&CentralIdentity::new(ActorType::Patient, 1).with_name("Ada", "Hopper"))
            .unwrap();

        let found = store.find_by_id(ActorType::Practitioner, 1).await.unwrap().unwrap();
        assert_eq!(found.first_name.as_deref(), Some("Grace"));
        assert!(store.find_by_id(ActorType::Practitioner, 2).await.unwrap().is_none());

        let ids = store
            .search_by_plaintext(ActorType::Patient, IdentityField::LastName, " HOPPER ")
            .await
            .unwrap();
        assert_eq!(ids, vec![1]);

        // Exact match only.
        let ids = store
            .search_by_plaintext(ActorType::Patient, IdentityField::LastName, "Hop")
            .await
            .unwrap();
        assert!(ids.is_empty());

        let batch = store
            .find_by_ids(ActorType::Practitioner, &[1, 5])
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_health_check() {
        assert!(store().health_check().is_ok());
    }
}
