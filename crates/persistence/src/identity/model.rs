//! Central identity records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::tenant::ActorType;

/// A practitioner or patient as recorded in the central database.
///
/// Personal fields are stored encrypted at rest; this is the decrypted view
/// handed to callers. Aggregation only ever reads these records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentralIdentity {
    /// Central id.
    pub id: i64,
    /// Practitioner or patient.
    #[serde(skip_serializing)]
    pub actor_type: ActorType,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CentralIdentity {
    /// Creates an identity with no personal fields set.
    pub fn new(actor_type: ActorType, id: i64) -> Self {
        Self {
            id,
            actor_type,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
        }
    }

    /// Sets first and last name.
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Returns the value of a blind-indexed field.
    pub fn field(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::FirstName => self.first_name.as_deref(),
            IdentityField::LastName => self.last_name.as_deref(),
            IdentityField::Email => self.email.as_deref(),
            IdentityField::Phone => self.phone.as_deref(),
        }
    }
}

/// Identity fields that carry a blind index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    FirstName,
    LastName,
    Email,
    Phone,
}

impl IdentityField {
    /// All searchable fields.
    pub const ALL: [IdentityField; 4] = [
        IdentityField::FirstName,
        IdentityField::LastName,
        IdentityField::Email,
        IdentityField::Phone,
    ];

    /// Returns the field name, which is also the blind-index column prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityField::FirstName => "first_name",
            IdentityField::LastName => "last_name",
            IdentityField::Email => "email",
            IdentityField::Phone => "phone",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_name" => Ok(IdentityField::FirstName),
            "last_name" => Ok(IdentityField::LastName),
            "email" => Ok(IdentityField::Email),
            "phone" => Ok(IdentityField::Phone),
            other => Err(ValidationError::InvalidValue {
                field: "search_field".to_string(),
                message: format!("unknown identity field '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accessor() {
        let identity = CentralIdentity::new(ActorType::Patient, 3)
            .with_name("Ada", "Lovelace")
            .with_email("ada@example.com");

        assert_eq!(identity.field(IdentityField::LastName), Some("Lovelace"));
        assert_eq!(identity.field(IdentityField::Phone), None);
    }

    #[test]
    fn test_field_parse() {
        assert_eq!("Email".parse::<IdentityField>().unwrap(), IdentityField::Email);
        assert!("ssn".parse::<IdentityField>().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let identity = CentralIdentity::new(ActorType::Patient, 3).with_name("Ada", "Lovelace");
        let json = serde_json::to_value(&identity).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["first_name"], "Ada");
        assert!(json["email"].is_null());
        assert!(json.get("actor_type").is_none());
    }
}
