//! Actor extractor.
//!
//! Reads the acting practitioner or patient from the `X-Actor-Type` and
//! `X-Actor-ID` headers. Authentication happens upstream; this layer only
//! trusts what the gateway forwards.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::HeaderName, request::Parts},
};
use caregrid_persistence::error::ValidationError;
use caregrid_persistence::tenant::{ActorRef, ActorType};

use crate::error::RestError;

/// Header naming the actor type (`practitioner` or `patient`).
pub static X_ACTOR_TYPE: HeaderName = HeaderName::from_static("x-actor-type");

/// Header carrying the actor's central id.
pub static X_ACTOR_ID: HeaderName = HeaderName::from_static("x-actor-id");

/// Axum extractor for the acting actor.
///
/// Rejects the request with `400 Bad Request` when either header is missing
/// or cannot be parsed.
///
/// # Example
///
/// ```rust,ignore
/// use caregrid_rest::extractors::ActorExtractor;
///
/// async fn handler(actor: ActorExtractor) {
///     println!("Acting as {}", actor.actor());
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ActorExtractor(ActorRef);

impl ActorExtractor {
    /// Returns the actor reference.
    pub fn actor(&self) -> ActorRef {
        self.0
    }

    /// Consumes the extractor and returns the actor reference.
    pub fn into_inner(self) -> ActorRef {
        self.0
    }
}

fn required_header<'h>(headers: &'h HeaderMap, name: &HeaderName) -> Result<&'h str, ValidationError> {
    let value = headers
        .get(name)
        .ok_or_else(|| ValidationError::MissingRequiredField {
            field: name.to_string(),
        })?;
    value
        .to_str()
        .map(str::trim)
        .map_err(|_| ValidationError::InvalidValue {
            field: name.to_string(),
            message: "header is not valid ASCII".to_string(),
        })
}

/// Parses an actor reference from request headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<ActorRef, ValidationError> {
    let actor_type: ActorType = required_header(headers, &X_ACTOR_TYPE)?.parse()?;

    let raw_id = required_header(headers, &X_ACTOR_ID)?;
    let id = raw_id
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ValidationError::InvalidValue {
            field: X_ACTOR_ID.to_string(),
            message: format!("'{}' is not a positive integer", raw_id),
        })?;

    Ok(ActorRef { actor_type, id })
}

impl<S> FromRequestParts<S> for ActorExtractor
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = actor_from_headers(&parts.headers)?;
        tracing::debug!(actor = %actor, "Extracted actor");
        Ok(ActorExtractor(actor))
    }
}
