//! Tenant and actor identifier types.
//!
//! This module defines the [`TenantId`] type, an opaque identifier for a
//! tenant (a practice with its own database), and [`ActorType`], which tells
//! whether a central actor is a practitioner or a patient.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An opaque tenant identifier.
///
/// Tenant ids are owned by the central database. The database-per-tenant
/// strategy derives the tenant's database location from this id, so it is
/// validated there against the configured pattern before use.
///
/// # Examples
///
/// ```
/// use caregrid_persistence::tenant::TenantId;
///
/// let tenant = TenantId::new("northside_physio");
/// assert_eq!(tenant.as_str(), "northside_physio");
/// assert_eq!(tenant.to_string(), "northside_physio");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a new tenant ID from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TenantId::new(s))
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        TenantId::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        TenantId::new(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The kind of central actor.
///
/// Practitioners and patients both live in the central database and are both
/// mirrored into every tenant they are linked to. When one kind of actor asks
/// for its appointments, the rows are decorated with the *other* kind, its
/// [`counterpart`](ActorType::counterpart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// A practitioner working for one or more practices.
    Practitioner,
    /// A patient registered with one or more practices.
    Patient,
}

impl ActorType {
    /// Returns the lowercase name used in storage and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::Practitioner => "practitioner",
            ActorType::Patient => "patient",
        }
    }

    /// Returns the actor type shown alongside this actor's appointments.
    ///
    /// ```
    /// use caregrid_persistence::tenant::ActorType;
    ///
    /// assert_eq!(ActorType::Practitioner.counterpart(), ActorType::Patient);
    /// assert_eq!(ActorType::Patient.counterpart(), ActorType::Practitioner);
    /// ```
    pub fn counterpart(&self) -> ActorType {
        match self {
            ActorType::Practitioner => ActorType::Patient,
            ActorType::Patient => ActorType::Practitioner,
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practitioner" => Ok(ActorType::Practitioner),
            "patient" => Ok(ActorType::Patient),
            other => Err(ValidationError::InvalidValue {
                field: "actor_type".to_string(),
                message: format!("unknown actor type '{}'", other),
            }),
        }
    }
}
