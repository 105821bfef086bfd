//! Server configuration for the CareGrid HTTP API.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CAREGRID_SERVER_PORT` | 8080 | Server port |
//! | `CAREGRID_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `CAREGRID_LOG_LEVEL` | info | Log level |
//! | `CAREGRID_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `CAREGRID_ENABLE_CORS` | true | Enable CORS |
//! | `CAREGRID_CORS_ORIGINS` | * | Allowed origins |
//! | `CAREGRID_CORS_METHODS` | GET,OPTIONS | Allowed methods |
//! | `CAREGRID_CORS_HEADERS` | Content-Type,Authorization,Accept,X-Actor-Type,X-Actor-ID | Allowed headers |
//! | `CAREGRID_ENABLE_REQUEST_ID` | true | Tag requests with an `x-request-id` |
//! | `CAREGRID_CENTRAL_DATABASE` | caregrid.db | Central SQLite file, or `:memory:` |
//! | `CAREGRID_TENANT_DATABASE_DIR` | data/tenants | Directory of per-tenant databases |
//! | `CAREGRID_TENANT_FILE_TEMPLATE` | {database}.db | Per-tenant file name template |
//! | `CAREGRID_BLIND_INDEX_KEY` | (none) | Key for identity blind indexes |
//! | `CAREGRID_DEFAULT_PER_PAGE` | 15 | Default page size |
//! | `CAREGRID_MAX_PER_PAGE` | 100 | Maximum page size |
//! | `CAREGRID_AGGREGATION_DEADLINE` | (none) | Budget for one tenant loop, e.g. `2s` |
//! | `CAREGRID_MAX_TENANTS` | 50 | Tenants visited per request |
//! | `CAREGRID_MAX_ROWS` | 10000 | Rows kept per request |
//! | `CAREGRID_EXPOSE_PARTIAL_FAILURES` | false | Add `partial` and `failed_tenants` to responses |
//!
//! # Example
//!
//! ```rust
//! use caregrid_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     expose_partial_failures: true,
//!     ..Default::default()
//! };
//! assert_eq!(config.socket_addr(), "0.0.0.0:3000");
//! ```

use std::path::PathBuf;
use std::time::Duration;

use caregrid_persistence::aggregate::AggregationConfig;
use caregrid_persistence::strategy::DatabasePerTenantConfig;
use clap::Parser;

/// Server configuration for the CareGrid HTTP API.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "caregrid")]
#[command(about = "CareGrid cross-tenant appointment server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "CAREGRID_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "CAREGRID_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "CAREGRID_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, env = "CAREGRID_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "CAREGRID_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "CAREGRID_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "CAREGRID_CORS_METHODS", default_value = "GET,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "CAREGRID_CORS_HEADERS",
        default_value = "Content-Type,Authorization,Accept,X-Actor-Type,X-Actor-ID"
    )]
    pub cors_headers: String,

    /// Enable request ID tracking.
    #[arg(long, env = "CAREGRID_ENABLE_REQUEST_ID", default_value = "true")]
    pub enable_request_id: bool,

    /// Central database file, or `:memory:`.
    #[arg(long, env = "CAREGRID_CENTRAL_DATABASE", default_value = "caregrid.db")]
    pub central_database: String,

    /// Directory holding one database file per tenant.
    #[arg(long, env = "CAREGRID_TENANT_DATABASE_DIR", default_value = "data/tenants")]
    pub tenant_database_dir: PathBuf,

    /// Per-tenant database file name template.
    #[arg(
        long,
        env = "CAREGRID_TENANT_FILE_TEMPLATE",
        default_value = "{database}.db"
    )]
    pub tenant_file_template: String,

    /// Key used to compute identity blind indexes.
    #[arg(long, env = "CAREGRID_BLIND_INDEX_KEY", hide_env_values = true)]
    pub blind_index_key: Option<String>,

    /// Default page size for appointment lists.
    #[arg(long, env = "CAREGRID_DEFAULT_PER_PAGE", default_value = "15")]
    pub default_per_page: usize,

    /// Maximum page size for appointment lists.
    #[arg(long, env = "CAREGRID_MAX_PER_PAGE", default_value = "100")]
    pub max_per_page: usize,

    /// Wall-clock budget for one tenant loop (e.g. `2s`, `500ms`).
    #[arg(long, env = "CAREGRID_AGGREGATION_DEADLINE", value_parser = humantime::parse_duration)]
    pub aggregation_deadline: Option<Duration>,

    /// Maximum number of tenants visited per request.
    #[arg(long, env = "CAREGRID_MAX_TENANTS", default_value = "50")]
    pub max_tenants: usize,

    /// Maximum number of merged rows kept per request.
    #[arg(long, env = "CAREGRID_MAX_ROWS", default_value = "10000")]
    pub max_rows: usize,

    /// Add `partial` and `failed_tenants` to aggregate responses.
    #[arg(long, env = "CAREGRID_EXPOSE_PARTIAL_FAILURES", default_value = "false")]
    pub expose_partial_failures: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization,Accept,X-Actor-Type,X-Actor-ID".to_string(),
            enable_request_id: true,
            central_database: "caregrid.db".to_string(),
            tenant_database_dir: PathBuf::from("data/tenants"),
            tenant_file_template: "{database}.db".to_string(),
            blind_index_key: None,
            default_per_page: 15,
            max_per_page: 100,
            aggregation_deadline: None,
            max_tenants: 50,
            max_rows: 10_000,
            expose_partial_failures: false,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns whether the central database lives in memory.
    pub fn is_memory(&self) -> bool {
        self.central_database == ":memory:"
    }

    /// Returns the aggregation limits.
    pub fn aggregation_config(&self) -> AggregationConfig {
        let config = AggregationConfig::new()
            .with_max_tenants(self.max_tenants)
            .with_max_rows(self.max_rows);
        match self.aggregation_deadline {
            Some(deadline) => config.with_deadline(deadline),
            None => config,
        }
    }

    /// Returns the per-tenant database layout.
    pub fn tenant_database_config(&self) -> DatabasePerTenantConfig {
        DatabasePerTenantConfig {
            file_template: self.tenant_file_template.clone(),
            ..DatabasePerTenantConfig::new().with_database_dir(&self.tenant_database_dir)
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_per_page == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_per_page > self.max_per_page {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if self.max_tenants == 0 {
            errors.push("Max tenants cannot be 0".to_string());
        }

        if self.max_rows == 0 {
            errors.push("Max rows cannot be 0".to_string());
        }

        if self.aggregation_deadline.is_some_and(|d| d.is_zero()) {
            errors.push("Aggregation deadline cannot be 0".to_string());
        }

        match self.blind_index_key.as_deref() {
            None | Some("") => errors.push("Blind index key is required".to_string()),
            Some(_) => {}
        }

        if !self.tenant_file_template.contains('{') {
            errors.push("Tenant file template must contain a placeholder".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Uses in-memory databases and ephemeral port 0.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            log_level: "debug".to_string(),
            request_timeout: 5,
            enable_cors: false,
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            enable_request_id: false,
            central_database: ":memory:".to_string(),
            blind_index_key: Some("test-key".to_string()),
            default_per_page: 15,
            max_per_page: 50,
            ..Default::default()
        }
    }
}
