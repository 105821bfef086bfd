//! Per-tenant SQLite databases.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params, params_from_iter, types::Value};

use super::backend::{DatabaseLocation, SqliteBackendConfig, SqlitePool, build_pool, ping};
use super::{format_timestamp, parse_timestamp, schema};
use crate::error::{BackendError, StorageError, StorageResult, TenantError};
use crate::query::{
    AppointmentFilters, AppointmentRow, StatusCounts, TenantConnector, TenantQueryExecutor,
};
use crate::strategy::{DatabasePerTenantConfig, DatabasePerTenantStrategy};
use crate::tenant::{ActorType, Tenant, TenantId};

/// A connection to one tenant database.
pub struct SqliteConnection(pub(crate) PooledConnection<SqliteConnectionManager>);

impl Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection").finish()
    }
}

/// A new appointment for [`SqliteTenantDatabases::add_appointment`].
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub practitioner_id: i64,
    pub patient_id: i64,
    pub service_id: Option<i64>,
    pub location_id: Option<i64>,
    pub starts_at: DateTime<Utc>,
    pub status: String,
}

/// Tenant-local table and pointer column for each actor type.
fn actor_columns(actor_type: ActorType) -> (&'static str, &'static str, &'static str) {
    match actor_type {
        ActorType::Practitioner => ("practitioners", "central_practitioner_id", "practitioner_id"),
        ActorType::Patient => ("patients", "central_patient_id", "patient_id"),
    }
}

/// One SQLite database per tenant, located by a [`DatabasePerTenantStrategy`].
///
/// Pools are opened lazily on first use. In file mode the least recently
/// used pools are closed once more than `max_pools` are open; in-memory
/// databases are never evicted since closing them would lose their data.
pub struct SqliteTenantDatabases {
    strategy: DatabasePerTenantStrategy,
    backend_config: SqliteBackendConfig,
    in_memory: bool,
    pools: Arc<RwLock<HashMap<TenantId, SqlitePool>>>,
}

impl Debug for SqliteTenantDatabases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTenantDatabases")
            .field("in_memory", &self.in_memory)
            .field("open_pools", &self.pools.read().len())
            .finish_non_exhaustive()
    }
}

impl SqliteTenantDatabases {
    /// Creates in-memory tenant databases. Tenants must be provisioned first.
    pub fn in_memory() -> StorageResult<Self> {
        Self::build(DatabasePerTenantConfig::default(), SqliteBackendConfig::default(), true)
    }

    /// Uses database files laid out by `config`.
    pub fn open(
        config: DatabasePerTenantConfig,
        backend_config: SqliteBackendConfig,
    ) -> StorageResult<Self> {
        Self::build(config, backend_config, false)
    }

    fn build(
        config: DatabasePerTenantConfig,
        backend_config: SqliteBackendConfig,
        in_memory: bool,
    ) -> StorageResult<Self> {
        let strategy = DatabasePerTenantStrategy::new(config).map_err(|e| {
            StorageError::Backend(BackendError::Internal {
                backend_name: "sqlite".to_string(),
                message: format!("invalid tenant id pattern: {e}"),
                source: Some(Box::new(e)),
            })
        })?;
        Ok(Self {
            strategy,
            backend_config,
            in_memory,
            pools: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Returns the tenancy strategy.
    pub fn strategy(&self) -> &DatabasePerTenantStrategy {
        &self.strategy
    }

    /// Creates the tenant's database and schema if needed.
    pub fn provision(&self, tenant: &Tenant) -> StorageResult<()> {
        self.pool(&tenant.id, true).map(|_| ())
    }

    /// Returns `true` if the tenant's database can be opened without creating it.
    pub fn exists(&self, tenant_id: &TenantId) -> bool {
        self.pools.read().contains_key(tenant_id)
            || (!self.in_memory && self.strategy.database_path(tenant_id).exists())
    }

    /// Checks every open tenant pool.
    pub fn health_check(&self) -> StorageResult<()> {
        let pools: Vec<_> = self.pools.read().values().cloned().collect();
        for pool in &pools {
            ping(pool)?;
        }
        Ok(())
    }

    /// Closes pools idle past the configured timeout (file mode only).
    pub fn evict_idle(&self) -> usize {
        if self.in_memory {
            return 0;
        }
        let idle = self.strategy.idle_tenants();
        for tenant in &idle {
            self.close_pool(tenant);
        }
        idle.len()
    }

    fn close_pool(&self, tenant: &str) {
        self.pools.write().remove(&TenantId::new(tenant));
        self.strategy.remove_pool_tracking(tenant);
        tracing::debug!(tenant = %tenant, "Closed tenant pool");
    }

    fn pool(&self, tenant_id: &TenantId, create: bool) -> StorageResult<SqlitePool> {
        self.strategy.validate(tenant_id)?;

        if let Some(pool) = self.pools.read().get(tenant_id).cloned() {
            self.strategy.record_pool_access(tenant_id);
            return Ok(pool);
        }

        let mut pools = self.pools.write();
        if let Some(pool) = pools.get(tenant_id).cloned() {
            self.strategy.record_pool_access(tenant_id);
            return Ok(pool);
        }

        let pool = if self.in_memory {
            if !create {
                return Err(TenantError::TenantNotFound {
                    tenant_id: tenant_id.clone(),
                }
                .into());
            }
            build_pool(DatabaseLocation::Memory, &self.backend_config, 1)?
        } else {
            let path = self.strategy.database_path(tenant_id);
            let may_create = create || self.strategy.config().auto_create_database;
            if !path.exists() {
                if !may_create {
                    return Err(TenantError::TenantNotFound {
                        tenant_id: tenant_id.clone(),
                    }
                    .into());
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(BackendError::from)?;
                }
            }
            build_pool(
                DatabaseLocation::File(&path),
                &self.backend_config,
                self.strategy.config().max_connections_per_pool,
            )?
        };

        schema::initialize_tenant_schema(&*pool.get()?)?;
        pools.insert(tenant_id.clone(), pool.clone());
        drop(pools);

        self.strategy.record_pool_access(tenant_id);
        tracing::debug!(tenant = %tenant_id, in_memory = self.in_memory, "Opened tenant pool");

        if !self.in_memory {
            for evicted in self.strategy.tenants_to_evict() {
                if evicted != tenant_id.as_str() {
                    self.close_pool(&evicted);
                }
            }
        }

        Ok(pool)
    }

    fn admin_connection(&self, tenant_id: &TenantId) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool(tenant_id, false)?.get()?)
    }

    /// Adds the tenant-local mirror row of a central actor.
    pub fn add_actor(&self, tenant_id: &TenantId, actor_type: ActorType, central_id: i64) -> StorageResult<i64> {
        let (table, pointer, _) = actor_columns(actor_type);
        let conn = self.admin_connection(tenant_id)?;
        conn.execute(&format!("INSERT INTO {table} ({pointer}) VALUES (?1)"), [central_id])?;
        Ok(conn.last_insert_rowid())
    }

    /// Adds a bookable service.
    pub fn add_service(&self, tenant_id: &TenantId, name: &str, duration_minutes: Option<i64>) -> StorageResult<i64> {
        let conn = self.admin_connection(tenant_id)?;
        conn.execute(
            "INSERT INTO services (name, duration_minutes) VALUES (?1, ?2)",
            params![name, duration_minutes],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Adds a location. `utc_offset_minutes` drives the localized start time.
    pub fn add_location(
        &self,
        tenant_id: &TenantId,
        name: &str,
        timezone: Option<&str>,
        utc_offset_minutes: Option<i32>,
    ) -> StorageResult<i64> {
        let conn = self.admin_connection(tenant_id)?;
        conn.execute(
            "INSERT INTO locations (name, timezone, utc_offset_minutes) VALUES (?1, ?2, ?3)",
            params![name, timezone, utc_offset_minutes],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Adds an appointment.
    pub fn add_appointment(&self, tenant_id: &TenantId, appointment: &NewAppointment) -> StorageResult<i64> {
        let conn = self.admin_connection(tenant_id)?;
        conn.execute(
            "INSERT INTO appointments (practitioner_id, patient_id, service_id, location_id, starts_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                appointment.practitioner_id,
                appointment.patient_id,
                appointment.service_id,
                appointment.location_id,
                format_timestamp(&appointment.starts_at),
                appointment.status,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// FROM/JOIN clause and WHERE conditions for an actor's appointments.
struct AppointmentQuery {
    from: String,
    conditions: Vec<String>,
    values: Vec<Value>,
}

impl AppointmentQuery {
    fn new(actor_type: ActorType, local_actor_id: i64, filters: &AppointmentFilters) -> Self {
        let (_, _, own_column) = actor_columns(actor_type);
        let (counterpart_table, counterpart_pointer, counterpart_column) =
            actor_columns(actor_type.counterpart());

        let from = format!(
            "FROM appointments a
             LEFT JOIN {counterpart_table} c ON c.id = a.{counterpart_column}
             LEFT JOIN services s ON s.id = a.service_id
             LEFT JOIN locations l ON l.id = a.location_id"
        );

        let mut query = Self {
            from,
            conditions: vec![format!("a.{own_column} = ?")],
            values: vec![Value::from(local_actor_id)],
        };

        if let Some(status) = &filters.status {
            query.push("a.status = ?", [Value::from(status.clone())]);
        }
        if let Some(min) = filters.starts_at_min() {
            query.push("a.starts_at >= ?", [Value::from(format_timestamp(&min))]);
        }
        if let Some(end) = filters.starts_at_end() {
            query.push("a.starts_at < ?", [Value::from(format_timestamp(&end))]);
        }

        let ids: Vec<i64> = filters
            .search_ids
            .as_ref()
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        let id_condition = (!ids.is_empty()).then(|| {
            format!(
                "c.{counterpart_pointer} IN ({})",
                vec!["?"; ids.len()].join(", ")
            )
        });
        let text_pattern = filters.search_text.as_ref().map(|t| format!("%{}%", escape_like(t)));

        match (id_condition, text_pattern) {
            (Some(ids_sql), Some(pattern)) => {
                let mut values: Vec<Value> = ids.into_iter().map(Value::from).collect();
                values.push(Value::from(pattern));
                query.push(&format!("({ids_sql} OR s.name LIKE ? ESCAPE '\\')"), values);
            }
            (Some(ids_sql), None) => {
                query.push(&ids_sql, ids.into_iter().map(Value::from));
            }
            (None, Some(pattern)) => {
                query.push("s.name LIKE ? ESCAPE '\\'", [Value::from(pattern)]);
            }
            (None, None) if filters.search_ids.is_some() => {
                // An identity search that matched nobody.
                query.push("0 = 1", []);
            }
            (None, None) => {}
        }

        query
    }

    fn push(&mut self, condition: &str, values: impl IntoIterator<Item = Value>) {
        self.conditions.push(condition.to_string());
        self.values.extend(values);
    }

    fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

struct RawAppointment {
    id: i64,
    starts_at: String,
    status: String,
    counterpart_central_id: Option<i64>,
    service_name: Option<String>,
    service_duration_minutes: Option<i64>,
    location_name: Option<String>,
    location_utc_offset_minutes: Option<i32>,
}

impl RawAppointment {
    fn into_row(self) -> StorageResult<AppointmentRow> {
        Ok(AppointmentRow {
            id: self.id,
            starts_at: parse_timestamp(&self.starts_at)?,
            status: self.status,
            counterpart_central_id: self.counterpart_central_id,
            service_name: self.service_name,
            service_duration_minutes: self.service_duration_minutes,
            location_name: self.location_name,
            location_utc_offset_minutes: self.location_utc_offset_minutes,
        })
    }
}

#[async_trait]
impl TenantConnector for SqliteTenantDatabases {
    type Connection = SqliteConnection;

    async fn connect(&self, tenant: &Tenant) -> StorageResult<SqliteConnection> {
        let pool = self.pool(&tenant.id, false)?;
        let conn = pool.get().map_err(|e| BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: format!("tenant {}: {e}", tenant.id),
        })?;
        Ok(SqliteConnection(conn))
    }

    async fn disconnect(&self, _tenant: &Tenant, _connection: SqliteConnection) -> StorageResult<()> {
        // Connection is returned to the pool when dropped
        Ok(())
    }
}

#[async_trait]
impl TenantQueryExecutor for SqliteTenantDatabases {
    async fn resolve_local_actor(
        &self,
        connection: &mut SqliteConnection,
        actor_type: ActorType,
        central_id: i64,
    ) -> StorageResult<Option<i64>> {
        let (table, pointer, _) = actor_columns(actor_type);
        let id = connection
            .0
            .query_row(
                &format!("SELECT id FROM {table} WHERE {pointer} = ?1"),
                [central_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    async fn query_appointments(
        &self,
        connection: &mut SqliteConnection,
        actor_type: ActorType,
        local_actor_id: i64,
        filters: &AppointmentFilters,
    ) -> StorageResult<Vec<AppointmentRow>> {
        let (_, counterpart_pointer, _) = actor_columns(actor_type.counterpart());
        let query = AppointmentQuery::new(actor_type, local_actor_id, filters);
        let sql = format!(
            "SELECT a.id, a.starts_at, a.status, c.{counterpart_pointer},
                    s.name, s.duration_minutes, l.name, l.utc_offset_minutes
             {}
             WHERE {}
             ORDER BY a.starts_at DESC, a.id ASC",
            query.from,
            query.where_clause()
        );

        let raw = {
            let mut stmt = connection.0.prepare(&sql)?;
            stmt.query_map(params_from_iter(query.values.iter()), |row| {
                Ok(RawAppointment {
                    id: row.get(0)?,
                    starts_at: row.get(1)?,
                    status: row.get(2)?,
                    counterpart_central_id: row.get(3)?,
                    service_name: row.get(4)?,
                    service_duration_minutes: row.get(5)?,
                    location_name: row.get(6)?,
                    location_utc_offset_minutes: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        raw.into_iter().map(RawAppointment::into_row).collect()
    }

    async fn appointment_counts(
        &self,
        connection: &mut SqliteConnection,
        actor_type: ActorType,
        local_actor_id: i64,
        filters: &AppointmentFilters,
    ) -> StorageResult<StatusCounts> {
        let query = AppointmentQuery::new(actor_type, local_actor_id, filters);
        let sql = format!(
            "SELECT a.status, COUNT(*) {} WHERE {} GROUP BY a.status",
            query.from,
            query.where_clause()
        );

        let mut stmt = connection.0.prepare(&sql)?;
        let counts = stmt
            .query_map(params_from_iter(query.values.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(counts
            .into_iter()
            .map(|(status, count)| (status, count.max(0) as u64))
            .collect())
    }

    async fn next_appointment(
        &self,
        connection: &mut SqliteConnection,
        actor_type: ActorType,
        local_actor_id: i64,
        after: DateTime<Utc>,
    ) -> StorageResult<Option<DateTime<Utc>>> {
        let (_, _, own_column) = actor_columns(actor_type);
        let next: Option<String> = connection.0.query_row(
            &format!("SELECT MIN(starts_at) FROM appointments WHERE {own_column} = ?1 AND starts_at >= ?2"),
            params![local_actor_id, format_timestamp(&after)],
            |row| row.get(0),
        )?;
        next.as_deref().map(parse_timestamp).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
    }

    struct Fixture {
        dbs: SqliteTenantDatabases,
        tenant: Tenant,
        practitioner: i64,
    }

    fn fixture() -> Fixture {
        let dbs = SqliteTenantDatabases::in_memory().unwrap();
        let tenant = Tenant::new("clinic_a", "Clinic A");
        dbs.provision(&tenant).unwrap();

        let practitioner = dbs.add_actor(&tenant.id, ActorType::Practitioner, 10).unwrap();
        let smith = dbs.add_actor(&tenant.id, ActorType::Patient, 100).unwrap();
        let jones = dbs.add_actor(&tenant.id, ActorType::Patient, 200).unwrap();
        let physio = dbs.add_service(&tenant.id, "Physiotherapy 50%", Some(45)).unwrap();
        let massage = dbs.add_service(&tenant.id, "Massage", Some(30)).unwrap();
        let main = dbs.add_location(&tenant.id, "Main St", Some("Europe/Paris"), Some(120)).unwrap();

        for (patient, service, starts_at, status) in [
            (smith, physio, ts(1, 9), "confirmed"),
            (jones, massage, ts(2, 9), "cancelled"),
            (smith, massage, ts(31, 23), "confirmed"),
        ] {
            dbs.add_appointment(
                &tenant.id,
                &NewAppointment {
                    practitioner_id: practitioner,
                    patient_id: patient,
                    service_id: Some(service),
                    location_id: Some(main),
                    starts_at,
                    status: status.to_string(),
                },
            )
            .unwrap();
        }

        Fixture {
            dbs,
            tenant,
            practitioner,
        }
    }

    async fn query(f: &Fixture, filters: AppointmentFilters) -> Vec<AppointmentRow> {
        let mut conn = f.dbs.connect(&f.tenant).await.unwrap();
        f.dbs
            .query_appointments(&mut conn, ActorType::Practitioner, f.practitioner, &filters)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_local_actor() {
        let f = fixture();
        let mut conn = f.dbs.connect(&f.tenant).await.unwrap();
        assert_eq!(
            f.dbs
                .resolve_local_actor(&mut conn, ActorType::Practitioner, 10)
                .await
                .unwrap(),
            Some(f.practitioner)
        );
        assert_eq!(
            f.dbs
                .resolve_local_actor(&mut conn, ActorType::Practitioner, 11)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_query_orders_and_decodes_rows() {
        let f = fixture();
        let rows = query(&f, AppointmentFilters::default()).await;

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].starts_at, ts(31, 23));
        assert_eq!(rows[2].starts_at, ts(1, 9));
        assert_eq!(rows[2].counterpart_central_id, Some(100));
        assert_eq!(rows[2].service_duration_minutes, Some(45));
        assert_eq!(rows[2].location_utc_offset_minutes, Some(120));
    }

    #[tokio::test]
    async fn test_status_and_inclusive_date_filters() {
        let f = fixture();

        let confirmed = query(&f, AppointmentFilters::new().with_status("confirmed")).await;
        assert_eq!(confirmed.len(), 2);

        let day = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let last_day = query(&f, AppointmentFilters::new().with_date_from(day).with_date_to(day)).await;
        assert_eq!(last_day.len(), 1);
        assert_eq!(last_day[0].starts_at, ts(31, 23));
    }

    #[tokio::test]
    async fn test_search_is_ids_or_text() {
        let f = fixture();

        let by_ids = query(&f, AppointmentFilters::new().with_search_ids([200])).await;
        assert_eq!(by_ids.len(), 1);

        let by_text = query(&f, AppointmentFilters::new().with_search_text("PHYSIO")).await;
        assert_eq!(by_text.len(), 1);

        let either = query(
            &f,
            AppointmentFilters::new()
                .with_search_ids([200])
                .with_search_text("physio"),
        )
        .await;
        assert_eq!(either.len(), 2);

        let text_only = query(
            &f,
            AppointmentFilters::new()
                .with_search_ids(Vec::new())
                .with_search_text("massage"),
        )
        .await;
        assert_eq!(text_only.len(), 2);

        let nobody = query(&f, AppointmentFilters::new().with_search_ids(Vec::new())).await;
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn test_like_wildcards_are_literal() {
        let f = fixture();
        assert_eq!(query(&f, AppointmentFilters::new().with_search_text("50%")).await.len(), 1);
        assert!(query(&f, AppointmentFilters::new().with_search_text("_")).await.is_empty());
    }

    #[tokio::test]
    async fn test_counts_and_next_appointment() {
        let f = fixture();
        let mut conn = f.dbs.connect(&f.tenant).await.unwrap();

        let counts = f
            .dbs
            .appointment_counts(&mut conn, ActorType::Practitioner, f.practitioner, &AppointmentFilters::default())
            .await
            .unwrap();
        assert_eq!(counts.get("confirmed"), Some(&2));
        assert_eq!(counts.get("cancelled"), Some(&1));

        let next = f
            .dbs
            .next_appointment(&mut conn, ActorType::Practitioner, f.practitioner, ts(1, 10))
            .await
            .unwrap();
        assert_eq!(next, Some(ts(2, 9)));
    }

    #[tokio::test]
    async fn test_unprovisioned_tenant_not_found() {
        let dbs = SqliteTenantDatabases::in_memory().unwrap();
        let err = dbs.connect(&Tenant::new("clinic_z", "Z")).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::TenantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_tenant_id_rejected() {
        let dbs = SqliteTenantDatabases::in_memory().unwrap();
        let err = dbs.provision(&Tenant::new("../etc", "bad")).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::InvalidTenant { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_mode_creates_and_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabasePerTenantConfig::default()
            .with_database_dir(dir.path())
            .with_max_pools(1);
        let dbs = SqliteTenantDatabases::open(config, SqliteBackendConfig::default()).unwrap();

        let a = Tenant::new("clinic_a", "A");
        let b = Tenant::new("clinic_b", "B");
        assert!(!dbs.exists(&a.id));
        assert!(dbs.connect(&a).await.is_err());

        dbs.provision(&a).unwrap();
        dbs.provision(&b).unwrap();
        assert!(dbs.strategy().database_path(&a.id).exists());
        assert_eq!(dbs.pools.read().len(), 1);

        // Evicted pools reopen from their file.
        assert!(dbs.connect(&a).await.is_ok());
        assert!(dbs.health_check().is_ok());
    }

    #[tokio::test]
    async fn test_lookalike_tenant_ids_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabasePerTenantConfig::default().with_database_dir(dir.path());
        let dbs = SqliteTenantDatabases::open(config, SqliteBackendConfig::default()).unwrap();

        let a = Tenant::new("clinic_a", "A");
        dbs.provision(&a).unwrap();

        let lookalike = Tenant::new("Clinic-A", "Other practice");
        assert_ne!(
            dbs.strategy().database_path(&a.id),
            dbs.strategy().database_path(&lookalike.id)
        );
        assert!(!dbs.exists(&lookalike.id));
        assert!(dbs.connect(&lookalike).await.is_err());
    }
}
