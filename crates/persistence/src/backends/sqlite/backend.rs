//! SQLite connection pools.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, StorageError, StorageResult};

/// Pool of SQLite connections.
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Configuration for SQLite pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteBackendConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode for file databases.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Enable foreign key constraints.
    #[serde(default = "default_true")]
    pub enable_foreign_keys: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl SqliteBackendConfig {
    /// Sets the pool size.
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Where a pool's database lives.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DatabaseLocation<'a> {
    /// A private in-memory database.
    Memory,
    /// A database file.
    File(&'a Path),
}

/// Builds a pool and applies the connection pragmas to every connection.
///
/// An in-memory database only exists as long as its connection does, so an
/// in-memory pool holds exactly one connection that is never recycled.
pub(crate) fn build_pool(
    location: DatabaseLocation<'_>,
    config: &SqliteBackendConfig,
    max_connections: u32,
) -> StorageResult<SqlitePool> {
    let busy_timeout = Duration::from_millis(config.busy_timeout_ms as u64);
    let foreign_keys = config.enable_foreign_keys;
    let wal = config.enable_wal && matches!(location, DatabaseLocation::File(_));

    let manager = match location {
        DatabaseLocation::Memory => SqliteConnectionManager::memory(),
        DatabaseLocation::File(path) => SqliteConnectionManager::file(path),
    }
    .with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        if foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        if wal {
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        }
        Ok(())
    });

    let builder = Pool::builder().connection_timeout(Duration::from_millis(
        config.connection_timeout_ms,
    ));
    let builder = match location {
        DatabaseLocation::Memory => builder
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None),
        DatabaseLocation::File(_) => builder
            .max_size(max_connections.max(1))
            .min_idle(Some(config.min_connections.min(max_connections.max(1)))),
    };

    builder.build(manager).map_err(|e| {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: e.to_string(),
        })
    })
}

/// Runs `SELECT 1` on a pooled connection.
pub(crate) fn ping(pool: &SqlitePool) -> StorageResult<()> {
    let conn = pool.get().map_err(|_| BackendError::Unavailable {
        backend_name: "sqlite".to_string(),
        message: "Failed to get connection".to_string(),
    })?;
    conn.query_row("SELECT 1", [], |_| Ok(()))
        .map_err(|e| BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: format!("Health check failed: {}", e),
            source: None,
        })?;
    Ok(())
}
