//! HTTP API integration tests.
//!
//! Runs the full router against in-memory SQLite central and tenant
//! databases.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use caregrid_persistence::aggregate::CrossTenantAggregator;
use caregrid_persistence::backends::sqlite::{
    NewAppointment, SqliteCentralStore, SqliteTenantDatabases,
};
use caregrid_persistence::identity::{BlindIndexer, CentralIdentity};
use caregrid_persistence::tenant::{
    ActorRef, ActorType, LinkStatus, Tenant, TenantAdministration, TenantId,
};
use caregrid_rest::{HealthCheck, ServerConfig, create_app_with_config};

const X_ACTOR_TYPE: HeaderName = HeaderName::from_static("x-actor-type");
const X_ACTOR_ID: HeaderName = HeaderName::from_static("x-actor-id");

const PRACTITIONER: i64 = 1;
const ADA: i64 = 10;
const ALAN: i64 = 11;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

/// Local actor ids inside one practice.
struct Practice {
    id: TenantId,
    practitioner: i64,
    ada: i64,
    alan: i64,
}

/// Seeded central and tenant databases.
struct Practices {
    central: Arc<SqliteCentralStore>,
    tenants: Arc<SqliteTenantDatabases>,
}

impl Practices {
    /// Two practices the practitioner works at, with three appointments.
    async fn seeded() -> Self {
        let central = Arc::new(
            SqliteCentralStore::in_memory(BlindIndexer::new("test-key").expect("Failed to create indexer"))
                .expect("Failed to create central store"),
        );
        let tenants = Arc::new(
            SqliteTenantDatabases::in_memory().expect("Failed to create tenant databases"),
        );

        central
            .register_identity(
                &CentralIdentity::new(ActorType::Practitioner, PRACTITIONER)
                    .with_name("Grace", "Hopper"),
            )
            .unwrap();
        central
            .register_identity(&CentralIdentity::new(ActorType::Patient, ADA).with_name("Ada", "Lovelace"))
            .unwrap();
        central
            .register_identity(&CentralIdentity::new(ActorType::Patient, ALAN).with_name("Alan", "Turing"))
            .unwrap();

        let practices = Self { central, tenants };
        let a = practices.practice("clinic_a", "Northside Physio").await;
        let b = practices.practice("clinic_b", "Harbour Dental").await;

        practices.appointment(&a, a.ada, at(1, 9), "confirmed");
        practices.appointment(&a, a.alan, at(3, 9), "cancelled");
        practices.appointment(&b, b.ada, at(2, 9), "confirmed");

        practices
    }

    /// Registers, provisions and links a practice, mirroring every actor into it.
    async fn practice(&self, id: &str, name: &str) -> Practice {
        let tenant = Tenant::new(id, name);
        self.central.register_tenant(&tenant).await.unwrap();
        self.tenants.provision(&tenant).unwrap();
        self.accept(ActorRef::practitioner(PRACTITIONER), &tenant.id).await;

        let local = |actor_type, central_id| self.tenants.add_actor(&tenant.id, actor_type, central_id).unwrap();
        Practice {
            practitioner: local(ActorType::Practitioner, PRACTITIONER),
            ada: local(ActorType::Patient, ADA),
            alan: local(ActorType::Patient, ALAN),
            id: tenant.id.clone(),
        }
    }

    async fn accept(&self, actor: ActorRef, tenant: &TenantId) {
        let link = self.central.invite(actor, tenant).await.unwrap();
        self.central.respond(link.id, LinkStatus::Accepted).await.unwrap();
    }

    fn appointment(&self, practice: &Practice, patient_id: i64, starts_at: DateTime<Utc>, status: &str) {
        let service_id = self.tenants.add_service(&practice.id, "Checkup", Some(30)).unwrap();
        self.tenants
            .add_appointment(
                &practice.id,
                &NewAppointment {
                    practitioner_id: practice.practitioner,
                    patient_id,
                    service_id: Some(service_id),
                    location_id: None,
                    starts_at,
                    status: status.to_string(),
                },
            )
            .unwrap();
    }

    fn server(&self, config: ServerConfig) -> TestServer {
        let aggregator = CrossTenantAggregator::new(
            self.central.clone(),
            self.central.clone(),
            self.tenants.clone(),
            config.aggregation_config(),
        );
        let health: Arc<dyn HealthCheck> = self.central.clone();
        let app = create_app_with_config(aggregator, health, config);
        TestServer::new(app).expect("Failed to create test server")
    }
}

async fn get_as(server: &TestServer, path: &str, actor_type: &'static str, actor_id: &'static str) -> Value {
    let response = server
        .get(path)
        .add_header(X_ACTOR_TYPE, HeaderValue::from_static(actor_type))
        .add_header(X_ACTOR_ID, HeaderValue::from_static(actor_id))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

fn tenant_ids(items: &Value) -> Vec<&str> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["tenant_id"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Appointments
// =============================================================================

#[tokio::test]
async fn test_appointments_merged_newest_first() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments", "practitioner", "1").await;

    assert_eq!(tenant_ids(&body["items"]), vec!["clinic_a", "clinic_b", "clinic_a"]);
    assert_eq!(body["items"][0]["tenant_name"], "Northside Physio");
    assert_eq!(body["items"][0]["counterpart"]["last_name"], "Turing");
    assert_eq!(body["items"][1]["counterpart"]["first_name"], "Ada");
    assert_eq!(body["items"][1]["service_name"], "Checkup");
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["current_page"], 1);
    assert_eq!(body["pagination"]["per_page"], 15);
    assert!(body.get("partial").is_none());
    assert!(body.get("failed_tenants").is_none());
}

#[tokio::test]
async fn test_appointments_status_filter_is_echoed() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments?status=cancelled&date_from=", "practitioner", "1").await;

    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["items"][0]["status"], "cancelled");
    assert_eq!(body["filters"]["status"], "cancelled");
    assert_eq!(body["filters"]["date_from"], Value::Null);
}

#[tokio::test]
async fn test_appointments_date_range() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(
        &server,
        "/appointments?date_from=2024-05-02&date_to=2024-05-02",
        "practitioner",
        "1",
    )
    .await;

    assert_eq!(tenant_ids(&body["items"]), vec!["clinic_b"]);
    assert_eq!(body["filters"]["date_from"], "2024-05-02");
}

#[tokio::test]
async fn test_appointments_search_by_counterpart_name() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments?search=Lovelace", "practitioner", "1").await;

    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(tenant_ids(&body["items"]), vec!["clinic_b", "clinic_a"]);
    assert_eq!(body["filters"]["search"], "Lovelace");
}

#[tokio::test]
async fn test_appointments_pagination() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments?perPage=1&page=2", "practitioner", "1").await;

    assert_eq!(tenant_ids(&body["items"]), vec!["clinic_b"]);
    let pagination = &body["pagination"];
    assert_eq!(pagination["last_page"], 3);
    assert_eq!(pagination["from"], 2);
    assert_eq!(pagination["to"], 2);
}

#[tokio::test]
async fn test_appointments_page_size_is_clamped() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments?perPage=500", "practitioner", "1").await;
    assert_eq!(body["pagination"]["per_page"], 50);

    let body = get_as(&server, "/appointments?perPage=abc&page=-1", "practitioner", "1").await;
    assert_eq!(body["pagination"]["per_page"], 15);
    assert_eq!(body["pagination"]["current_page"], 1);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments?page=9", "practitioner", "1").await;

    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["from"], Value::Null);
}

#[tokio::test]
async fn test_patient_sees_only_linked_practices() {
    let practices = Practices::seeded().await;
    practices
        .accept(ActorRef::patient(ADA), &TenantId::new("clinic_a"))
        .await;
    let server = practices.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments", "patient", "10").await;

    assert_eq!(tenant_ids(&body["items"]), vec!["clinic_a"]);
    assert_eq!(body["items"][0]["counterpart"]["last_name"], "Hopper");
}

#[tokio::test]
async fn test_actor_without_links_gets_empty_list() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments", "patient", "11").await;

    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total"], 0);
    assert_eq!(body["pagination"]["last_page"], 1);
}

// =============================================================================
// Actor headers
// =============================================================================

#[tokio::test]
async fn test_missing_actor_headers_is_bad_request() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let response = server.get("/appointments").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "invalid");
    assert!(body["error"]["message"].as_str().unwrap().contains("x-actor-type"));
}

#[tokio::test]
async fn test_invalid_actor_type_is_bad_request() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let response = server
        .get("/tenants")
        .add_header(X_ACTOR_TYPE, HeaderValue::from_static("admin"))
        .add_header(X_ACTOR_ID, HeaderValue::from_static("1"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_actor_is_forbidden() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    for path in ["/appointments", "/dashboard", "/tenants"] {
        let response = server
            .get(path)
            .add_header(X_ACTOR_TYPE, HeaderValue::from_static("practitioner"))
            .add_header(X_ACTOR_ID, HeaderValue::from_static("999"))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.json::<Value>()["error"]["code"], "forbidden");
    }
}

// =============================================================================
// Partial failures
// =============================================================================

/// Adds a linked practice whose database was never provisioned.
async fn with_broken_practice() -> Practices {
    let practices = Practices::seeded().await;
    let ghost = Tenant::new("clinic_ghost", "Ghost Clinic");
    practices.central.register_tenant(&ghost).await.unwrap();
    practices
        .accept(ActorRef::practitioner(PRACTITIONER), &ghost.id)
        .await;
    practices
}

#[tokio::test]
async fn test_failed_tenant_is_hidden_by_default() {
    let server = with_broken_practice().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/appointments", "practitioner", "1").await;

    assert_eq!(body["pagination"]["total"], 3);
    assert!(body.get("partial").is_none());
    assert!(body.get("failed_tenants").is_none());
}

#[tokio::test]
async fn test_failed_tenant_is_exposed_when_enabled() {
    let config = ServerConfig {
        expose_partial_failures: true,
        ..ServerConfig::for_testing()
    };
    let server = with_broken_practice().await.server(config);

    let body = get_as(&server, "/appointments", "practitioner", "1").await;
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["partial"], true);
    assert_eq!(body["failed_tenants"][0]["tenant_id"], "clinic_ghost");
    assert_eq!(body["failed_tenants"][0]["stage"], "entering");

    let body = get_as(&server, "/dashboard", "practitioner", "1").await;
    assert_eq!(body["partial"], true);
    assert_eq!(body["tenants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_complete_pass_reports_not_partial() {
    let config = ServerConfig {
        expose_partial_failures: true,
        ..ServerConfig::for_testing()
    };
    let server = Practices::seeded().await.server(config);

    let body = get_as(&server, "/appointments", "practitioner", "1").await;

    assert_eq!(body["partial"], false);
    assert_eq!(body["failed_tenants"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Dashboard and tenants
// =============================================================================

#[tokio::test]
async fn test_dashboard_counts_per_tenant_and_totals() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let body = get_as(&server, "/dashboard", "practitioner", "1").await;

    let tenants = body["tenants"].as_array().unwrap();
    assert_eq!(tenants.len(), 2);
    let a = tenants.iter().find(|t| t["tenant_id"] == "clinic_a").unwrap();
    assert_eq!(a["counts"]["confirmed"], 1);
    assert_eq!(a["counts"]["cancelled"], 1);
    assert_eq!(body["totals"]["confirmed"], 2);
    assert_eq!(body["totals"]["cancelled"], 1);
}

#[tokio::test]
async fn test_tenants_lists_accepted_links_only() {
    let practices = Practices::seeded().await;
    let pending = Tenant::new("clinic_c", "Eastside Optics");
    practices.central.register_tenant(&pending).await.unwrap();
    practices
        .central
        .invite(ActorRef::practitioner(PRACTITIONER), &pending.id)
        .await
        .unwrap();
    let server = practices.server(ServerConfig::for_testing());

    let body = get_as(&server, "/tenants", "practitioner", "1").await;

    let mut ids: Vec<_> = body["tenants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["clinic_a", "clinic_b"]);
    assert!(body["tenants"][0]["link_id"].is_i64());
}

// =============================================================================
// System endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = Practices::seeded().await.server(ServerConfig::for_testing());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "sqlite");

    server.get("/_liveness").await.assert_status_ok();
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let config = ServerConfig {
        enable_request_id: true,
        ..ServerConfig::for_testing()
    };
    let server = Practices::seeded().await.server(config);

    let response = server.get("/_liveness").await;

    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}
