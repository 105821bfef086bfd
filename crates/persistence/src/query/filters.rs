//! Appointment filters.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Filters applied to a tenant's appointment query.
///
/// `search_ids` and `search_text` are combined with a logical OR: a row
/// matches when its counterpart's central id is in `search_ids` *or* its
/// service name contains `search_text`. An empty `search_ids` set together
/// with a `search_text` still matches on text alone.
///
/// # Example
///
/// ```
/// use caregrid_persistence::query::AppointmentFilters;
/// use chrono::NaiveDate;
///
/// let filters = AppointmentFilters::new()
///     .with_status("confirmed")
///     .with_date_from(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
///     .with_search_text("physio");
///
/// assert!(filters.has_search());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilters {
    /// Exact-match status filter.
    pub status: Option<String>,
    /// Inclusive lower bound on the appointment date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the appointment date.
    pub date_to: Option<NaiveDate>,
    /// Central identity ids matched against the counterpart pointer.
    pub search_ids: Option<BTreeSet<i64>>,
    /// Case-insensitive substring matched against the service name.
    pub search_text: Option<String>,
}

impl AppointmentFilters {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds filters from loosely validated request parameters.
    ///
    /// Empty strings mean "no filter"; dates must be `YYYY-MM-DD` and are
    /// ignored otherwise.
    pub fn from_params(
        status: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        Self {
            status: non_empty(status),
            date_from: non_empty(date_from).and_then(|d| parse_date(&d)),
            date_to: non_empty(date_to).and_then(|d| parse_date(&d)),
            search_ids: None,
            search_text: non_empty(search),
        }
    }

    /// Sets the status filter.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the inclusive lower date bound.
    pub fn with_date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    /// Sets the inclusive upper date bound.
    pub fn with_date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    /// Sets the identity ids to match.
    pub fn with_search_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.search_ids = Some(ids.into_iter().collect());
        self
    }

    /// Sets the free-text search.
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Returns `true` if any search criterion is present.
    pub fn has_search(&self) -> bool {
        self.search_ids.is_some() || self.search_text.is_some()
    }

    /// First instant included by `date_from`.
    pub fn starts_at_min(&self) -> Option<DateTime<Utc>> {
        self.date_from
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// First instant excluded by `date_to` (the start of the following day).
    pub fn starts_at_end(&self) -> Option<DateTime<Utc>> {
        self.date_to
            .and_then(|d| d.succ_opt())
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(value = %value, error = %e, "Ignoring malformed date filter");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params_empty_strings_are_no_filter() {
        let filters = AppointmentFilters::from_params(Some(""), Some(" "), None, Some(""));
        assert_eq!(filters, AppointmentFilters::default());
        assert!(!filters.has_search());
    }

    #[test]
    fn test_from_params_parses_values() {
        let filters = AppointmentFilters::from_params(
            Some("confirmed"),
            Some("2024-05-01"),
            Some("2024-05-31"),
            Some(" Smith "),
        );
        assert_eq!(filters.status.as_deref(), Some("confirmed"));
        assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(filters.date_to, NaiveDate::from_ymd_opt(2024, 5, 31));
        assert_eq!(filters.search_text.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_malformed_dates_are_ignored() {
        let filters = AppointmentFilters::from_params(None, Some("05/01/2024"), Some("soon"), None);
        assert!(filters.date_from.is_none());
        assert!(filters.date_to.is_none());
    }

    #[test]
    fn test_date_bounds_are_inclusive_days() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let filters = AppointmentFilters::new().with_date_from(day).with_date_to(day);

        assert_eq!(
            filters.starts_at_min().unwrap().to_rfc3339(),
            "2024-05-31T00:00:00+00:00"
        );
        assert_eq!(
            filters.starts_at_end().unwrap().to_rfc3339(),
            "2024-06-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_empty_search_ids_still_count_as_search() {
        let filters = AppointmentFilters::new().with_search_ids(Vec::new());
        assert!(filters.has_search());
    }
}
