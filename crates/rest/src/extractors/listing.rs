//! Appointment list query extractor.
//!
//! Extracts `status`, `date_from`, `date_to`, `search`, `perPage` and `page`
//! from the query string. Validation is loose: empty strings mean "no
//! filter", and values that do not parse are ignored rather than rejected.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use caregrid_persistence::query::AppointmentFilters;
use serde::Deserialize;

use crate::error::RestError;

/// Raw query parameters of `GET /appointments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    /// Exact-match status.
    pub status: Option<String>,
    /// Inclusive start date, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`.
    pub date_to: Option<String>,
    /// Plaintext search over counterpart identity and service name.
    pub search: Option<String>,
    /// Page size.
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
    /// 1-based page number.
    pub page: Option<String>,
}

impl ListingQuery {
    /// Builds appointment filters from the raw values.
    pub fn filters(&self) -> AppointmentFilters {
        AppointmentFilters::from_params(
            self.status.as_deref(),
            self.date_from.as_deref(),
            self.date_to.as_deref(),
            self.search.as_deref(),
        )
    }

    /// Returns the requested page number, if it parses.
    pub fn page(&self) -> Option<usize> {
        parse_number(self.page.as_deref())
    }

    /// Returns the requested page size, if it parses.
    pub fn per_page(&self) -> Option<usize> {
        parse_number(self.per_page.as_deref())
    }
}

/// Parses a non-negative number; negative values count as zero.
fn parse_number(raw: Option<&str>) -> Option<usize> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<i64>() {
        Ok(n) => Some(usize::try_from(n).unwrap_or(0)),
        Err(_) => {
            tracing::debug!(value = %raw, "Ignoring non-numeric paging parameter");
            None
        }
    }
}

/// Axum extractor for appointment list parameters.
#[derive(Debug, Clone)]
pub struct ListingParams(pub ListingQuery);

impl<S> FromRequestParts<S> for ListingParams
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ListingQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| RestError::BadRequest {
                message: format!("Invalid query string: {}", e),
            })?;
        Ok(ListingParams(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/appointments?{}", encoded).parse().unwrap();
        Query::<ListingQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_empty_values_mean_no_filter() {
        let q = query(&[("status", ""), ("date_from", ""), ("search", "")]);
        assert_eq!(q.filters(), AppointmentFilters::default());
    }

    #[test]
    fn test_filters() {
        let q = query(&[
            ("status", "confirmed"),
            ("date_from", "2024-05-01"),
            ("date_to", "not-a-date"),
            ("search", "smith"),
        ]);
        let filters = q.filters();
        assert_eq!(filters.status.as_deref(), Some("confirmed"));
        assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(filters.date_to, None);
        assert_eq!(filters.search_text.as_deref(), Some("smith"));
        assert_eq!(filters.search_ids, None);
    }

    #[test]
    fn test_paging_values() {
        let q = query(&[("perPage", "25"), ("page", "-3")]);
        assert_eq!(q.per_page(), Some(25));
        assert_eq!(q.page(), Some(0));

        let q = query(&[("perPage", "lots")]);
        assert_eq!(q.per_page(), None);
        assert_eq!(q.page(), None);
    }
}
