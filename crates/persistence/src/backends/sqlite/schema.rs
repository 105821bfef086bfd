//! SQLite schema definitions.
//!
//! Two schemas live here: the central schema (tenants, tenant links and
//! identities) and the tenant schema that every per-tenant database carries.
//! Both track their version in a `schema_version` table.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current central schema version.
pub const CENTRAL_SCHEMA_VERSION: i32 = 1;

/// Current tenant schema version.
pub const TENANT_SCHEMA_VERSION: i32 = 1;

/// Initialize the central database schema.
pub fn initialize_central_schema(conn: &Connection) -> StorageResult<()> {
    if get_schema_version(conn)? < CENTRAL_SCHEMA_VERSION {
        create_central_v1(conn)?;
        set_schema_version(conn, CENTRAL_SCHEMA_VERSION)?;
    }
    Ok(())
}

/// Initialize a tenant database schema.
pub fn initialize_tenant_schema(conn: &Connection) -> StorageResult<()> {
    if get_schema_version(conn)? < TENANT_SCHEMA_VERSION {
        create_tenant_v1(conn)?;
        set_schema_version(conn, TENANT_SCHEMA_VERSION)?;
    }
    Ok(())
}

fn schema_error(context: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::SchemaError {
        message: format!("{context}: {e}"),
    })
}

/// Get the current schema version, 0 for a fresh database.
pub(crate) fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| schema_error("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| schema_error("Failed to clear schema_version", e))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| schema_error("Failed to set schema_version", e))?;
    Ok(())
}

fn create_central_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            timezone TEXT,
            company_name TEXT,
            created_at TEXT NOT NULL
        );

        -- Personal fields are paired with blind indexes for exact-match search.
        CREATE TABLE IF NOT EXISTS identities (
            actor_type TEXT NOT NULL,
            id INTEGER NOT NULL,
            first_name TEXT,
            last_name TEXT,
            email TEXT,
            phone TEXT,
            first_name_bidx TEXT,
            last_name_bidx TEXT,
            email_bidx TEXT,
            phone_bidx TEXT,
            PRIMARY KEY (actor_type, id)
        );

        CREATE INDEX IF NOT EXISTS idx_identities_first_name_bidx
            ON identities(actor_type, first_name_bidx);
        CREATE INDEX IF NOT EXISTS idx_identities_last_name_bidx
            ON identities(actor_type, last_name_bidx);
        CREATE INDEX IF NOT EXISTS idx_identities_email_bidx
            ON identities(actor_type, email_bidx);
        CREATE INDEX IF NOT EXISTS idx_identities_phone_bidx
            ON identities(actor_type, phone_bidx);

        CREATE TABLE IF NOT EXISTS tenant_links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            actor_type TEXT NOT NULL,
            actor_id INTEGER NOT NULL,
            tenant_id TEXT NOT NULL REFERENCES tenants(id),
            status TEXT NOT NULL,
            invited_at TEXT NOT NULL,
            responded_at TEXT,
            UNIQUE (actor_type, actor_id, tenant_id)
        );

        CREATE INDEX IF NOT EXISTS idx_tenant_links_actor
            ON tenant_links(actor_type, actor_id, status);",
    )
    .map_err(|e| schema_error("Failed to create central schema", e))
}

fn create_tenant_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS practitioners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            central_practitioner_id INTEGER UNIQUE
        );

        CREATE TABLE IF NOT EXISTS patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            central_patient_id INTEGER UNIQUE
        );

        CREATE TABLE IF NOT EXISTS services (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            duration_minutes INTEGER
        );

        CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            timezone TEXT,
            utc_offset_minutes INTEGER
        );

        CREATE TABLE IF NOT EXISTS appointments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            practitioner_id INTEGER NOT NULL REFERENCES practitioners(id),
            patient_id INTEGER NOT NULL REFERENCES patients(id),
            service_id INTEGER REFERENCES services(id),
            location_id INTEGER REFERENCES locations(id),
            starts_at TEXT NOT NULL,
            status TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_appointments_practitioner
            ON appointments(practitioner_id, starts_at);
        CREATE INDEX IF NOT EXISTS idx_appointments_patient
            ON appointments(patient_id, starts_at);",
    )
    .map_err(|e| schema_error("Failed to create tenant schema", e))
}
