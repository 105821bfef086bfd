//! Aggregation limits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::identity::IdentityField;

/// Limits and search settings for one aggregation pass.
///
/// # Example
///
/// ```
/// use caregrid_persistence::aggregate::AggregationConfig;
///
/// let config: AggregationConfig =
///     serde_json::from_str(r#"{"deadline": "2s", "max_tenants": 10}"#).unwrap();
///
/// assert_eq!(config.deadline, Some(std::time::Duration::from_secs(2)));
/// assert_eq!(config.max_tenants, 10);
/// assert_eq!(config.max_rows, 10_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Wall-clock budget for the whole tenant loop. `None` means unbounded.
    ///
    /// A visit in progress is only interrupted at an await point where the
    /// executor yields. The SQLite executor runs each query to completion
    /// without yielding, so there the budget is enforced by the check made
    /// before each tenant: the tenant that overruns keeps its rows and every
    /// tenant after it is skipped.
    #[serde(with = "optional_humantime", default)]
    pub deadline: Option<Duration>,

    /// Maximum number of tenants visited per pass; further tenants are skipped.
    #[serde(default = "default_max_tenants")]
    pub max_tenants: usize,

    /// Maximum number of rows kept after the merge sort.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Identity fields consulted when a plaintext search term is given.
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<IdentityField>,
}

fn default_max_tenants() -> usize {
    50
}

fn default_max_rows() -> usize {
    10_000
}

fn default_search_fields() -> Vec<IdentityField> {
    IdentityField::ALL.to_vec()
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            deadline: None,
            max_tenants: default_max_tenants(),
            max_rows: default_max_rows(),
            search_fields: default_search_fields(),
        }
    }
}

impl AggregationConfig {
    /// Creates a configuration with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the loop deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the tenant fan-out cap.
    pub fn with_max_tenants(mut self, max: usize) -> Self {
        self.max_tenants = max;
        self
    }

    /// Sets the row cap.
    pub fn with_max_rows(mut self, max: usize) -> Self {
        self.max_rows = max;
        self
    }

    /// Sets the fields searched by plaintext terms.
    pub fn with_search_fields(mut self, fields: impl IntoIterator<Item = IdentityField>) -> Self {
        self.search_fields = fields.into_iter().collect();
        self
    }
}

/// Serde module for an optional Duration in humantime format.
mod optional_humantime {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
