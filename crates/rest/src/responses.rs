//! Response bodies.
//!
//! The aggregate endpoints return the merged data as-is. When the server is
//! configured to expose partial failures, two extra fields are appended:
//!
//! ```json
//! { "partial": true, "failed_tenants": [{"tenant_id": "...", "stage": "querying", "message": "..."}] }
//! ```

use caregrid_persistence::aggregate::{
    AggregatedAppointment, AppointmentList, DashboardSummary, LinkedTenant, PassReport,
    TenantFailure, TenantSummary,
};
use caregrid_persistence::query::{AppointmentFilters, StatusCounts};
use caregrid_persistence::types::PageInfo;
use chrono::NaiveDate;
use serde::Serialize;

/// Partial-failure fields appended to aggregate responses.
#[derive(Debug, Serialize)]
pub struct PartialFailures<'a> {
    /// `true` if any tenant failed, was skipped, or rows were dropped.
    pub partial: bool,
    /// The tenants that did not contribute.
    pub failed_tenants: &'a [TenantFailure],
}

impl<'a> PartialFailures<'a> {
    /// Returns the fields for `report`, or `None` when they are not exposed.
    pub fn from_report(report: &'a PassReport, expose: bool) -> Option<Self> {
        expose.then(|| Self {
            partial: report.is_partial(),
            failed_tenants: &report.failed_tenants,
        })
    }
}

/// The filters echoed back with an appointment list.
#[derive(Debug, Serialize)]
pub struct FilterEcho<'a> {
    /// Status filter.
    pub status: Option<&'a str>,
    /// Inclusive start date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive end date.
    pub date_to: Option<NaiveDate>,
    /// Search term.
    pub search: Option<&'a str>,
}

impl<'a> From<&'a AppointmentFilters> for FilterEcho<'a> {
    fn from(filters: &'a AppointmentFilters) -> Self {
        Self {
            status: filters.status.as_deref(),
            date_from: filters.date_from,
            date_to: filters.date_to,
            search: filters.search_text.as_deref(),
        }
    }
}

/// Body of `GET /appointments`.
#[derive(Debug, Serialize)]
pub struct AppointmentsBody<'a> {
    /// The current page of appointments.
    pub items: &'a [AggregatedAppointment],
    /// Position of the page in the full result.
    pub pagination: PageInfo,
    /// The filters that were applied.
    pub filters: FilterEcho<'a>,
    /// Partial-failure fields, when exposed.
    #[serde(flatten)]
    pub failures: Option<PartialFailures<'a>>,
}

impl<'a> AppointmentsBody<'a> {
    /// Builds the body for `list`.
    pub fn new(list: &'a AppointmentList, expose_failures: bool) -> Self {
        Self {
            items: &list.page.items,
            pagination: list.page.pagination,
            filters: FilterEcho::from(&list.filters),
            failures: PartialFailures::from_report(&list.report, expose_failures),
        }
    }
}

/// Body of `GET /dashboard`.
#[derive(Debug, Serialize)]
pub struct DashboardBody<'a> {
    /// Per-tenant counts.
    pub tenants: &'a [TenantSummary],
    /// Counts summed over all tenants.
    pub totals: &'a StatusCounts,
    /// Partial-failure fields, when exposed.
    #[serde(flatten)]
    pub failures: Option<PartialFailures<'a>>,
}

impl<'a> DashboardBody<'a> {
    /// Builds the body for `summary`.
    pub fn new(summary: &'a DashboardSummary, expose_failures: bool) -> Self {
        Self {
            tenants: &summary.tenants,
            totals: &summary.totals,
            failures: PartialFailures::from_report(&summary.report, expose_failures),
        }
    }
}

/// Body of `GET /tenants`.
#[derive(Debug, Serialize)]
pub struct TenantsBody<'a> {
    /// The actor's accepted tenants.
    pub tenants: &'a [LinkedTenant],
}

#[cfg(test)]
mod tests {
    use super::*;
    use caregrid_persistence::aggregate::TenantStage;
    use caregrid_persistence::tenant::TenantId;
    use caregrid_persistence::types::{Page, PageRequest};

    fn list(failures: Vec<TenantFailure>) -> AppointmentList {
        let report = PassReport {
            failed_tenants: failures,
            ..Default::default()
        };
        AppointmentList {
            page: Page::empty(PageRequest::default()),
            filters: AppointmentFilters::new().with_status("confirmed"),
            report,
        }
    }

    #[test]
    fn test_failures_hidden_by_default() {
        let list = list(Vec::new());
        let body = serde_json::to_value(AppointmentsBody::new(&list, false)).unwrap();
        assert!(body.get("partial").is_none());
        assert!(body.get("failed_tenants").is_none());
        assert_eq!(body["filters"]["status"], "confirmed");
        assert_eq!(body["pagination"]["last_page"], 1);
    }

    #[test]
    fn test_failures_exposed() {
        let list = list(vec![TenantFailure {
            tenant_id: TenantId::new("clinic_b"),
            stage: TenantStage::Querying,
            message: "disk I/O error".to_string(),
        }]);
        let body = serde_json::to_value(AppointmentsBody::new(&list, true)).unwrap();
        assert_eq!(body["partial"], true);
        assert_eq!(body["failed_tenants"][0]["tenant_id"], "clinic_b");
        assert_eq!(body["failed_tenants"][0]["stage"], "querying");
    }
}
