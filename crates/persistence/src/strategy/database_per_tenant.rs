//! Database-per-tenant tenancy strategy.
//!
//! Every tenant has a completely separate database. This strategy turns a
//! [`TenantId`] into the location of that database and keeps track of which
//! tenant pools are open so that idle or least recently used pools can be
//! closed.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TenantError;
use crate::tenant::TenantId;

/// Configuration for database-per-tenant strategy.
///
/// # Example
///
/// ```
/// use caregrid_persistence::strategy::DatabasePerTenantConfig;
///
/// let config = DatabasePerTenantConfig {
///     database_dir: "/var/lib/caregrid/tenants".into(),
///     max_pools: Some(100),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabasePerTenantConfig {
    /// Directory holding one database file per tenant.
    #[serde(default = "default_database_dir")]
    pub database_dir: PathBuf,

    /// File name template.
    ///
    /// Supported placeholders:
    /// - `{database}` - The database name (prefix + file-safe id + suffix)
    /// - `{tenant}` - The file-safe tenant ID
    /// - `{tenant_hash}` - Stable hash of the tenant ID
    #[serde(default = "default_file_template")]
    pub file_template: String,

    /// Maximum number of tenant pools kept open.
    ///
    /// If exceeded, least recently used pools are closed.
    #[serde(default)]
    pub max_pools: Option<usize>,

    /// Maximum connections per tenant pool.
    #[serde(default = "default_max_connections")]
    pub max_connections_per_pool: u32,

    /// Seconds after which an unused tenant pool counts as idle.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Maximum length for tenant IDs in database names.
    #[serde(default = "default_max_tenant_id_length")]
    pub max_tenant_id_length: usize,

    /// Allowed characters in tenant IDs (regex pattern).
    #[serde(default = "default_tenant_id_pattern")]
    pub tenant_id_pattern: String,

    /// Whether to create the database file when a tenant is first opened.
    #[serde(default)]
    pub auto_create_database: bool,

    /// Database name prefix.
    #[serde(default = "default_database_prefix")]
    pub database_prefix: String,

    /// Database name suffix.
    #[serde(default)]
    pub database_suffix: String,
}

fn default_database_dir() -> PathBuf {
    PathBuf::from("data/tenants")
}

fn default_file_template() -> String {
    "{database}.db".to_string()
}

fn default_max_connections() -> u32 {
    4
}

fn default_idle_timeout() -> u64 {
    300 // 5 minutes
}

fn default_max_tenant_id_length() -> usize {
    32
}

fn default_tenant_id_pattern() -> String {
    r"^[a-zA-Z][a-zA-Z0-9_-]*$".to_string()
}

fn default_database_prefix() -> String {
    "tenant_".to_string()
}

impl Default for DatabasePerTenantConfig {
    fn default() -> Self {
        Self {
            database_dir: default_database_dir(),
            file_template: default_file_template(),
            max_pools: Some(100),
            max_connections_per_pool: default_max_connections(),
            idle_timeout_secs: default_idle_timeout(),
            max_tenant_id_length: default_max_tenant_id_length(),
            tenant_id_pattern: default_tenant_id_pattern(),
            auto_create_database: false,
            database_prefix: default_database_prefix(),
            database_suffix: String::new(),
        }
    }
}

impl DatabasePerTenantConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory holding tenant databases.
    pub fn with_database_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.database_dir = dir.into();
        self
    }

    /// Enables auto-creation of databases.
    pub fn with_auto_create(mut self) -> Self {
        self.auto_create_database = true;
        self
    }

    /// Sets the maximum number of pools.
    pub fn with_max_pools(mut self, max: usize) -> Self {
        self.max_pools = Some(max);
        self
    }

    /// Sets the database prefix.
    pub fn with_database_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.database_prefix = prefix.into();
        self
    }
}

/// Database-per-tenant tenancy strategy implementation.
///
/// # Database Naming
///
/// Database names are generated from tenant IDs. Every tenant ID maps to its
/// own name: an ID made of lowercase letters, digits and `_` within
/// `max_tenant_id_length` is used as is, any other ID is replaced by its hash.
/// Hashed names contain a `-`, which no verbatim ID does.
///
/// ```text
/// tenant_id: "northside_physio"
/// database:  "tenant_northside_physio"  (with default prefix/suffix)
/// file:      "{database_dir}/tenant_northside_physio.db"
///
/// tenant_id: "Northside-Physio"
/// database:  "tenant_t-<32 hex digits>"
/// ```
///
/// # Example
///
/// ```
/// use caregrid_persistence::strategy::{DatabasePerTenantConfig, DatabasePerTenantStrategy};
/// use caregrid_persistence::tenant::TenantId;
///
/// let config = DatabasePerTenantConfig::default().with_database_dir("/srv/tenants");
/// let strategy = DatabasePerTenantStrategy::new(config).unwrap();
///
/// let path = strategy.database_path(&TenantId::new("acme"));
/// assert!(path.ends_with("tenant_acme.db"));
/// ```
#[derive(Debug, Clone)]
pub struct DatabasePerTenantStrategy {
    config: DatabasePerTenantConfig,
    tenant_pattern: regex::Regex,
    /// Last access time per open tenant pool.
    pool_access_times: Arc<RwLock<HashMap<String, Instant>>>,
}

impl DatabasePerTenantStrategy {
    /// Creates a new database-per-tenant strategy with the given configuration.
    pub fn new(config: DatabasePerTenantConfig) -> Result<Self, regex::Error> {
        let tenant_pattern = regex::Regex::new(&config.tenant_id_pattern)?;
        Ok(Self {
            config,
            tenant_pattern,
            pool_access_times: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatabasePerTenantConfig {
        &self.config
    }

    /// Validates that a tenant ID can name a database.
    pub fn validate(&self, tenant_id: &TenantId) -> Result<(), TenantError> {
        let id = tenant_id.as_str();

        if !self.tenant_pattern.is_match(id) {
            return Err(TenantError::InvalidTenant {
                tenant_id: id.to_string(),
                reason: format!(
                    "tenant ID does not match required pattern for database names: {}",
                    self.config.tenant_id_pattern
                ),
            });
        }

        Ok(())
    }

    /// Generates the database name for a tenant.
    pub fn database_name(&self, tenant_id: &TenantId) -> String {
        let sanitized = self.sanitize_tenant_id(tenant_id);
        format!(
            "{}{}{}",
            self.config.database_prefix, sanitized, self.config.database_suffix
        )
    }

    /// Generates the database file path for a tenant.
    pub fn database_path(&self, tenant_id: &TenantId) -> PathBuf {
        let file_name = self
            .config
            .file_template
            .replace("{database}", &self.database_name(tenant_id))
            .replace("{tenant}", &self.sanitize_tenant_id(tenant_id))
            .replace("{tenant_hash}", &self.hash_tenant_id(tenant_id));
        self.config.database_dir.join(file_name)
    }

    /// Records access to a tenant's pool for LRU tracking.
    pub fn record_pool_access(&self, tenant_id: &TenantId) {
        let mut times = self.pool_access_times.write();
        times.insert(tenant_id.as_str().to_string(), Instant::now());
    }

    /// Returns tenants that should be evicted based on LRU.
    pub fn tenants_to_evict(&self) -> Vec<String> {
        let times = self.pool_access_times.read();
        let max_pools = self.config.max_pools.unwrap_or(usize::MAX);

        if times.len() <= max_pools {
            return Vec::new();
        }

        let mut entries: Vec<_> = times.iter().collect();
        entries.sort_by_key(|(_, time)| *time);

        let to_evict = times.len() - max_pools;
        entries
            .into_iter()
            .take(to_evict)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Removes a tenant from the access tracking.
    pub fn remove_pool_tracking(&self, tenant_id: &str) {
        let mut times = self.pool_access_times.write();
        times.remove(tenant_id);
    }

    /// Returns tenants with pools that have exceeded idle timeout.
    pub fn idle_tenants(&self) -> Vec<String> {
        let times = self.pool_access_times.read();
        let timeout = Duration::from_secs(self.config.idle_timeout_secs);
        let now = Instant::now();

        times
            .iter()
            .filter(|(_, last_access)| now.duration_since(**last_access) > timeout)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Returns the file-safe form of a tenant ID.
    ///
    /// The mapping is one-to-one: IDs are never rewritten, only kept or hashed.
    fn sanitize_tenant_id(&self, tenant_id: &TenantId) -> String {
        let id = tenant_id.as_str();
        let file_safe = !id.is_empty()
            && id.len() <= self.config.max_tenant_id_length
            && id
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');

        if file_safe {
            id.to_string()
        } else {
            self.hash_tenant_id(tenant_id)
        }
    }

    /// Generates a stable hash for a tenant ID.
    ///
    /// The hash names files on disk, so it must not change between builds.
    fn hash_tenant_id(&self, tenant_id: &TenantId) -> String {
        let digest = Sha256::digest(tenant_id.as_str().as_bytes());
        format!("t-{}", hex::encode(&digest[..16]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_per_tenant_config_default() {
        let config = DatabasePerTenantConfig::default();
        assert_eq!(config.max_pools, Some(100));
        assert_eq!(config.database_prefix, "tenant_");
        assert_eq!(config.file_template, "{database}.db");
    }

    #[test]
    fn test_database_per_tenant_config_builder() {
        let config = DatabasePerTenantConfig::new()
            .with_max_pools(50)
            .with_database_prefix("db_")
            .with_auto_create();

        assert_eq!(config.max_pools, Some(50));
        assert_eq!(config.database_prefix, "db_");
        assert!(config.auto_create_database);
    }

    #[test]
    fn test_database_name_generation() {
        let strategy = DatabasePerTenantStrategy::new(DatabasePerTenantConfig::default()).unwrap();

        assert_eq!(strategy.database_name(&TenantId::new("acme")), "tenant_acme");
        assert_eq!(
            strategy.database_name(&TenantId::new("northside_physio")),
            "tenant_northside_physio"
        );
        assert!(
            strategy
                .database_name(&TenantId::new("Northside-Physio"))
                .starts_with("tenant_t-")
        );
    }

    #[test]
    fn test_distinct_tenants_never_share_a_database() {
        let strategy = DatabasePerTenantStrategy::new(DatabasePerTenantConfig::default()).unwrap();

        let ids = ["clinic_a", "Clinic-A", "CLINIC_A", "clinic-a", "Clinic_a"];
        let paths: std::collections::HashSet<_> = ids
            .iter()
            .map(|id| strategy.database_path(&TenantId::new(*id)))
            .collect();
        assert_eq!(paths.len(), ids.len());

        // A verbatim ID that looks like a hashed name still gets its own file.
        let hashed = strategy.database_name(&TenantId::new("Clinic-A"));
        let lookalike = hashed.trim_start_matches("tenant_").replace('-', "_");
        assert_ne!(strategy.database_name(&TenantId::new(lookalike)), hashed);
    }

    #[test]
    fn test_database_path_uses_template() {
        let config = DatabasePerTenantConfig {
            database_dir: PathBuf::from("/srv/tenants"),
            file_template: "{tenant}/{database}.sqlite".to_string(),
            ..Default::default()
        };
        let strategy = DatabasePerTenantStrategy::new(config).unwrap();

        let path = strategy.database_path(&TenantId::new("acme"));
        assert_eq!(path, PathBuf::from("/srv/tenants/acme/tenant_acme.sqlite"));
    }

    #[test]
    fn test_tenant_validation_valid() {
        let strategy = DatabasePerTenantStrategy::new(DatabasePerTenantConfig::default()).unwrap();
        assert!(strategy.validate(&TenantId::new("acme")).is_ok());
        assert!(strategy.validate(&TenantId::new("Acme123")).is_ok());
        assert!(strategy.validate(&TenantId::new("tenant_one")).is_ok());
        assert!(strategy.validate(&TenantId::new("clinic-two")).is_ok());
    }

    #[test]
    fn test_tenant_validation_invalid_pattern() {
        let strategy = DatabasePerTenantStrategy::new(DatabasePerTenantConfig::default()).unwrap();
        assert!(strategy.validate(&TenantId::new("123acme")).is_err());
        assert!(strategy.validate(&TenantId::new("../etc")).is_err());
    }

    #[test]
    fn test_pool_access_tracking() {
        let strategy = DatabasePerTenantStrategy::new(DatabasePerTenantConfig::default()).unwrap();

        strategy.record_pool_access(&TenantId::new("tenant1"));
        strategy.record_pool_access(&TenantId::new("tenant2"));

        let times = strategy.pool_access_times.read();
        assert!(times.contains_key("tenant1"));
        assert!(times.contains_key("tenant2"));
    }

    #[test]
    fn test_tenants_to_evict() {
        let config = DatabasePerTenantConfig {
            max_pools: Some(2),
            ..Default::default()
        };
        let strategy = DatabasePerTenantStrategy::new(config).unwrap();

        strategy.record_pool_access(&TenantId::new("tenant1"));
        std::thread::sleep(Duration::from_millis(10));
        strategy.record_pool_access(&TenantId::new("tenant2"));
        std::thread::sleep(Duration::from_millis(10));
        strategy.record_pool_access(&TenantId::new("tenant3"));

        let to_evict = strategy.tenants_to_evict();
        assert_eq!(to_evict, vec!["tenant1".to_string()]);

        strategy.remove_pool_tracking("tenant1");
        assert!(strategy.tenants_to_evict().is_empty());
    }

    #[test]
    fn test_idle_tenants() {
        let config = DatabasePerTenantConfig {
            idle_timeout_secs: 0,
            ..Default::default()
        };
        let strategy = DatabasePerTenantStrategy::new(config).unwrap();
        strategy.record_pool_access(&TenantId::new("tenant1"));
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(strategy.idle_tenants(), vec!["tenant1".to_string()]);
    }

    #[test]
    fn test_long_tenant_id_hashing() {
        let config = DatabasePerTenantConfig {
            max_tenant_id_length: 10,
            ..Default::default()
        };
        let strategy = DatabasePerTenantStrategy::new(config).unwrap();

        let long_id = TenantId::new("this_is_a_very_long_tenant_identifier");
        let db_name = strategy.database_name(&long_id);

        assert!(db_name.starts_with("tenant_t-"));
        assert_eq!(db_name, strategy.database_name(&long_id));
        assert_eq!(db_name.len(), "tenant_t-".len() + 32);
    }
}
