//! Error types for the CareGrid HTTP API.
//!
//! Every error is returned as a JSON body of the form
//! `{"error": {"code": "...", "message": "..."}}`.
//!
//! # Error Mapping
//!
//! Storage errors from the persistence layer are mapped to HTTP status codes:
//!
//! | Storage Error | HTTP Status | Code |
//! |--------------|-------------|------|
//! | AccessDenied | 403 | forbidden |
//! | ValidationError | 400 | invalid |
//! | InvalidTenant | 400 | invalid |
//! | TenantNotFound | 404 | not-found |
//! | Unavailable / ConnectionFailed | 503 | unavailable |
//! | everything else | 500 | exception |
//!
//! Per-tenant failures never reach this layer; the aggregator absorbs them.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use caregrid_persistence::error::{
    AggregationError, BackendError, IdentityError, StorageError, TenantError, ValidationError,
};
use std::fmt;

/// The primary error type for REST API operations.
#[derive(Debug)]
pub enum RestError {
    /// Bad request, such as missing or malformed actor headers (HTTP 400).
    BadRequest {
        /// Error message.
        message: String,
    },

    /// The actor may not see aggregate data (HTTP 403).
    Forbidden {
        /// Error message.
        message: String,
    },

    /// Something the request named does not exist (HTTP 404).
    NotFound {
        /// Error message.
        message: String,
    },

    /// A backing database cannot be reached (HTTP 503).
    ServiceUnavailable {
        /// Error message.
        message: String,
    },

    /// Internal server error (HTTP 500).
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            RestError::BadRequest { .. } => "invalid",
            RestError::Forbidden { .. } => "forbidden",
            RestError::NotFound { .. } => "not-found",
            RestError::ServiceUnavailable { .. } => "unavailable",
            RestError::InternalError { .. } => "exception",
        }
    }

    fn message(&self) -> &str {
        match self {
            RestError::BadRequest { message }
            | RestError::Forbidden { message }
            | RestError::NotFound { message }
            | RestError::ServiceUnavailable { message }
            | RestError::InternalError { message } => message,
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::BadRequest { message } => write!(f, "Bad request: {}", message),
            RestError::Forbidden { message } => write!(f, "Forbidden: {}", message),
            RestError::NotFound { message } => write!(f, "Not found: {}", message),
            RestError::ServiceUnavailable { message } => {
                write!(f, "Service unavailable: {}", message)
            }
            RestError::InternalError { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for RestError {}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = create_error_body(self.code(), self.message());
        (status, Json(body)).into_response()
    }
}

/// Creates the JSON error body.
fn create_error_body(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

// Implement conversions from storage errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Tenant(e) => e.into(),
            StorageError::Identity(e) => e.into(),
            StorageError::Aggregation(e) => e.into(),
            StorageError::Validation(e) => e.into(),
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<TenantError> for RestError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::InvalidTenant { .. } | TenantError::InvalidLinkTransition { .. } => {
                RestError::BadRequest {
                    message: err.to_string(),
                }
            }
            TenantError::TenantNotFound { .. } | TenantError::LinkNotFound { .. } => {
                RestError::NotFound {
                    message: err.to_string(),
                }
            }
            TenantError::ActorNotFound { .. } => RestError::Forbidden {
                message: err.to_string(),
            },
            TenantError::ContextAlreadyActive { .. } | TenantError::NoActiveContext => {
                RestError::InternalError {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<AggregationError> for RestError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::AccessDenied { .. } => RestError::Forbidden {
                message: err.to_string(),
            },
            AggregationError::TenantQueryFailure { .. } => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<IdentityError> for RestError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::UnsearchableField { .. } => RestError::BadRequest {
                message: err.to_string(),
            },
            IdentityError::ResolutionFailed { .. } | IdentityError::InvalidIndexKey { .. } => {
                RestError::InternalError {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<ValidationError> for RestError {
    fn from(err: ValidationError) -> Self {
        RestError::BadRequest {
            message: err.to_string(),
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable { .. }
            | BackendError::ConnectionFailed { .. }
            | BackendError::PoolExhausted { .. } => RestError::ServiceUnavailable {
                message: err.to_string(),
            },
            _ => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

/// Result type for REST operations.
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use caregrid_persistence::tenant::ActorType;

    #[test]
    fn test_access_denied_is_forbidden() {
        let err: RestError = StorageError::from(AggregationError::AccessDenied {
            actor_type: ActorType::Patient,
            actor_id: 7,
        })
        .into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn test_backend_errors() {
        let err: RestError = BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: "refused".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: RestError = BackendError::QueryError {
            message: "syntax".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err: RestError = ValidationError::MissingRequiredField {
            field: "X-Actor-ID".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("X-Actor-ID"));
    }

    #[test]
    fn test_error_body_shape() {
        let body = create_error_body("invalid", "bad header");
        assert_eq!(body["error"]["code"], "invalid");
        assert_eq!(body["error"]["message"], "bad header");
    }
}
