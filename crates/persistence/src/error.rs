//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates tenant errors, identity errors,
//! aggregation errors, validation errors and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::{ActorType, LinkStatus, TenantId};

/// The primary error type for all storage operations.
///
/// This enum encompasses all possible errors that can occur during persistence
/// operations, organized by category.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Tenant binding and registry errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Central identity errors
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Cross-tenant aggregation errors
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to tenant binding and the tenant registry.
#[derive(Error, Debug)]
pub enum TenantError {
    /// A linked tenant id has no tenant record.
    #[error("tenant not found: {tenant_id}")]
    TenantNotFound { tenant_id: TenantId },

    /// `enter` was called while another tenant is still bound.
    #[error("tenant context already active: {active} is bound, cannot enter {requested}")]
    ContextAlreadyActive {
        active: TenantId,
        requested: TenantId,
    },

    /// A tenant-scoped operation ran without a bound tenant.
    #[error("no tenant context is active")]
    NoActiveContext,

    /// The tenant id does not satisfy the configured naming rules.
    #[error("invalid tenant '{tenant_id}': {reason}")]
    InvalidTenant { tenant_id: String, reason: String },

    /// The actor has no central identity record.
    #[error("{actor_type} {actor_id} not found")]
    ActorNotFound { actor_type: ActorType, actor_id: i64 },

    /// The tenant link does not exist.
    #[error("tenant link not found: {link_id}")]
    LinkNotFound { link_id: i64 },

    /// A tenant link status transition that is not allowed.
    #[error("invalid link transition for link {link_id}: {from} -> {to}")]
    InvalidLinkTransition {
        link_id: i64,
        from: LinkStatus,
        to: LinkStatus,
    },
}

/// Errors related to central identity lookups.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Lookup of a single identity failed.
    #[error("identity resolution failed for {actor_type} {id}: {message}")]
    ResolutionFailed {
        actor_type: ActorType,
        id: i64,
        message: String,
    },

    /// The field is not blind-indexed.
    #[error("field '{field}' is not searchable")]
    UnsearchableField { field: String },

    /// The blind index key cannot key an HMAC.
    #[error("invalid blind index key: {message}")]
    InvalidIndexKey { message: String },
}

/// Errors raised by the cross-tenant aggregator.
#[derive(Error, Debug)]
pub enum AggregationError {
    /// The actor has no identity record at all.
    #[error("access denied: {actor_type} profile {actor_id} not found")]
    AccessDenied { actor_type: ActorType, actor_id: i64 },

    /// A failure while querying or decorating one tenant's rows.
    #[error("query failed for tenant {tenant_id}: {message}")]
    TenantQueryFailure { tenant_id: TenantId, message: String },
}

/// Errors related to input validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A field carried a value that could not be interpreted.
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema bootstrap error.
    #[error("schema initialization failed: {message}")]
    SchemaError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Internal {
            backend_name: "unknown".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

impl StorageError {
    /// Returns `true` if this error means the actor may not use the aggregator at all.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            StorageError::Aggregation(AggregationError::AccessDenied { .. })
        )
    }
}
