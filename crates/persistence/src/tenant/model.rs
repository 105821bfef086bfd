//! Central tenant records and tenant links.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ActorType, TenantId};
use crate::error::{TenantError, ValidationError};

/// A tenant (practice) as stored in the central database.
///
/// Tenants are read-only for the duration of an aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// The tenant identifier.
    pub id: TenantId,
    /// Display name shown next to each of the tenant's rows.
    pub name: String,
    /// Practice-level settings.
    #[serde(default)]
    pub metadata: TenantMetadata,
}

impl Tenant {
    /// Creates a tenant with empty metadata.
    pub fn new(id: impl Into<TenantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metadata: TenantMetadata::default(),
        }
    }

    /// Sets the practice timezone name.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.metadata.timezone = Some(timezone.into());
        self
    }

    /// Sets the registered company name.
    pub fn with_company_name(mut self, company_name: impl Into<String>) -> Self {
        self.metadata.company_name = Some(company_name.into());
        self
    }
}

/// Practice-level settings carried with a [`Tenant`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMetadata {
    /// IANA timezone name configured for the practice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Registered company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// Status of a tenant link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Invitation sent, not answered yet.
    Pending,
    /// Invitation accepted. Only accepted links take part in aggregation.
    Accepted,
    /// Invitation declined.
    Rejected,
    /// Invitation was never answered in time.
    Expired,
}

impl LinkStatus {
    /// Returns the lowercase name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Accepted => "accepted",
            LinkStatus::Rejected => "rejected",
            LinkStatus::Expired => "expired",
        }
    }

    /// Returns `true` if a link may move from `self` to `next`.
    ///
    /// Only pending links change status; every answer is final.
    pub fn can_transition_to(&self, next: LinkStatus) -> bool {
        matches!(
            (self, next),
            (
                LinkStatus::Pending,
                LinkStatus::Accepted | LinkStatus::Rejected | LinkStatus::Expired
            )
        )
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LinkStatus::Pending),
            "accepted" => Ok(LinkStatus::Accepted),
            "rejected" => Ok(LinkStatus::Rejected),
            "expired" => Ok(LinkStatus::Expired),
            other => Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown link status '{}'", other),
            }),
        }
    }
}

/// Relationship between a central actor and a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantLink {
    /// Link identifier.
    pub id: i64,
    /// Kind of the linked actor.
    pub actor_type: ActorType,
    /// Central id of the linked actor.
    pub actor_id: i64,
    /// The tenant the actor is linked to.
    pub tenant_id: TenantId,
    /// Current status.
    pub status: LinkStatus,
    /// When the invitation was created.
    pub invited_at: DateTime<Utc>,
    /// When the status last changed away from pending.
    pub responded_at: Option<DateTime<Utc>>,
}

impl TenantLink {
    /// Returns `true` if this link takes part in aggregation.
    pub fn is_accepted(&self) -> bool {
        self.status == LinkStatus::Accepted
    }

    /// Applies a status change, enforcing the allowed transitions.
    pub fn transition(&mut self, next: LinkStatus, at: DateTime<Utc>) -> Result<(), TenantError> {
        if !self.status.can_transition_to(next) {
            return Err(TenantError::InvalidLinkTransition {
                link_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.responded_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_link() -> TenantLink {
        TenantLink {
            id: 1,
            actor_type: ActorType::Practitioner,
            actor_id: 10,
            tenant_id: TenantId::new("clinic_a"),
            status: LinkStatus::Pending,
            invited_at: Utc::now(),
            responded_at: None,
        }
    }

    #[test]
    fn test_pending_can_be_answered() {
        for next in [LinkStatus::Accepted, LinkStatus::Rejected, LinkStatus::Expired] {
            let mut link = pending_link();
            assert!(link.transition(next, Utc::now()).is_ok());
            assert_eq!(link.status, next);
            assert!(link.responded_at.is_some());
        }
    }

    #[test]
    fn test_answers_are_final() {
        let mut link = pending_link();
        link.transition(LinkStatus::Rejected, Utc::now()).unwrap();

        let result = link.transition(LinkStatus::Accepted, Utc::now());
        assert!(matches!(
            result,
            Err(TenantError::InvalidLinkTransition { link_id: 1, .. })
        ));
        assert_eq!(link.status, LinkStatus::Rejected);
    }

    #[test]
    fn test_status_roundtrip_names() {
        for status in [
            LinkStatus::Pending,
            LinkStatus::Accepted,
            LinkStatus::Rejected,
            LinkStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<LinkStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<LinkStatus>().is_err());
    }

    #[test]
    fn test_tenant_builder() {
        let tenant = Tenant::new("clinic_a", "Clinic A")
            .with_timezone("Europe/London")
            .with_company_name("Clinic A Ltd");
        assert_eq!(tenant.metadata.timezone.as_deref(), Some("Europe/London"));
        assert_eq!(tenant.metadata.company_name.as_deref(), Some("Clinic A Ltd"));
    }
}
