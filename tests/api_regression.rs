//! API Regression Tests
//!
//! In-process tests that build the axum router over the in-memory store and
//! exercise the /api/* endpoints using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port, no database.

use gasdyn_hub::api::build_router;
use gasdyn_hub::{HubConfig, HubState, MemoryStore};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const PASSPHRASE: &str = "test-passphrase";

struct TestHub {
    state: Arc<HubState<MemoryStore>>,
}

impl TestHub {
    fn new() -> Self {
        Self::with_config(HubConfig {
            passphrase: PASSPHRASE.to_string(),
            ..HubConfig::default()
        })
    }

    fn with_config(config: HubConfig) -> Self {
        Self {
            state: HubState::new(MemoryStore::new(), config),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let app = build_router(Arc::clone(&self.state));
        let resp = app.oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Authenticated request as `user` (passphrase + X-User-ID).
    async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {PASSPHRASE}"));
        if let Some(id) = user {
            builder = builder.header("X-User-ID", id.to_string());
        }
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn register(&self, email: &str, is_admin: bool) -> Uuid {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "email": email, "is_admin": is_admin })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
        id_of(&body, "id")
    }

    async fn seed_well(&self, user: Uuid) -> Uuid {
        let (_, location) = self
            .call(
                Method::POST,
                "/api/locations",
                Some(user),
                Some(json!({ "name": "Samotlor" })),
            )
            .await;
        let (_, cluster) = self
            .call(
                Method::POST,
                "/api/clusters",
                Some(user),
                Some(json!({ "name": "Pad 12", "location_id": location["id"] })),
            )
            .await;
        let (status, well) = self
            .call(
                Method::POST,
                "/api/wells",
                Some(user),
                Some(json!({ "name": "W-1201", "cluster_id": cluster["id"] })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create well: {well}");
        id_of(&well, "id")
    }
}

fn id_of(body: &Value, field: &str) -> Uuid {
    body[field]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("missing {field} in {body}"))
}

// ============================================================================
// Health & auth
// ============================================================================

#[tokio::test]
async fn test_health_needs_no_auth() {
    let hub = TestHub::new();
    let (status, body) = hub
        .send(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["db_connected"], true);
}

#[tokio::test]
async fn test_missing_bearer_is_unauthorized() {
    let hub = TestHub::new();
    let (status, body) = hub
        .send(
            Request::builder()
                .uri("/api/reports")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_wrong_passphrase_is_forbidden() {
    let hub = TestHub::new();
    let (status, _) = hub
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/users")
                .header(header::AUTHORIZATION, "Bearer not-the-passphrase")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "email": "a@b.example" }).to_string()))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_identity_required() {
    let hub = TestHub::new();

    let (status, _) = hub.call(Method::GET, "/api/reports", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = hub
        .call(Method::GET, "/api/reports", Some(Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_user_conflicts() {
    let hub = TestHub::new();
    hub.register("driller@field.example", false).await;

    let (status, body) = hub
        .call(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": "driller@field.example" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

// ============================================================================
// Report lifecycle
// ============================================================================

#[tokio::test]
async fn test_report_lifecycle() {
    let hub = TestHub::new();
    let owner = hub.register("owner@field.example", false).await;
    let other = hub.register("other@field.example", false).await;
    let well_id = hub.seed_well(owner).await;

    // Create
    let (status, created) = hub
        .call(
            Method::POST,
            "/api/reports",
            Some(owner),
            Some(json!({
                "title": "Initial survey",
                "well_id": well_id,
                "depth": 2500.0,
                "pressure": 180.0,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["calculated"]["required_charges"], 450);
    let external_id = id_of(&created, "external_id");
    let report_uri = format!("/api/reports/{external_id}");

    // Not visible to other yet
    let (status, _) = hub.call(Method::GET, &report_uri, Some(other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Share read-only
    let share_uri = format!("{report_uri}/share");
    let (status, permission) = hub
        .call(
            Method::POST,
            &share_uri,
            Some(owner),
            Some(json!({ "email": "other@field.example" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{permission}");
    assert_eq!(permission["can_edit"], false);
    assert_eq!(permission["is_owner"], false);

    let (status, _) = hub
        .call(
            Method::POST,
            &share_uri,
            Some(owner),
            Some(json!({ "email": "other@field.example", "can_edit": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, fetched) = hub.call(Method::GET, &report_uri, Some(other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["external_id"], created["external_id"]);

    // Read-only user cannot update
    let update = json!({ "well_id": well_id, "depth": 3000.0, "pressure": 200.0 });
    let (status, _) = hub
        .call(Method::PUT, &report_uri, Some(other), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner updates: same report, new state, new calculation
    let (status, updated) = hub
        .call(Method::PUT, &report_uri, Some(owner), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["id"], created["id"]);
    assert_ne!(updated["well_state_id"], created["well_state_id"]);
    assert_eq!(updated["calculated"]["required_charges"], 600);

    // Non-owner cannot delete
    let (status, _) = hub.call(Method::DELETE, &report_uri, Some(other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Revoke, then other loses access
    let (status, ack) = hub
        .call(
            Method::DELETE,
            &format!("{report_uri}/revoke?email=other@field.example"),
            Some(owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{ack}");
    assert!(ack["message"].is_string());

    let (status, _) = hub.call(Method::GET, &report_uri, Some(other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Owner deletes
    let (status, _) = hub.call(Method::DELETE, &report_uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = hub.call(Method::GET, &report_uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Well states survive report deletion
    let (status, states) = hub
        .call(
            Method::GET,
            &format!("/api/well-states?well_id={well_id}"),
            Some(owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(states.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_post_with_external_id_updates() {
    let hub = TestHub::new();
    let owner = hub.register("owner@field.example", false).await;
    let well_id = hub.seed_well(owner).await;

    let (_, created) = hub
        .call(
            Method::POST,
            "/api/reports",
            Some(owner),
            Some(json!({ "well_id": well_id, "depth": 100.0, "pressure": 50.0 })),
        )
        .await;

    let (status, updated) = hub
        .call(
            Method::POST,
            "/api/reports",
            Some(owner),
            Some(json!({
                "external_id": created["external_id"],
                "well_id": well_id,
                "depth": 100.0,
                "pressure": 50.0,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    // Unchanged measurement reuses the snapshot
    assert_eq!(updated["well_state_id"], created["well_state_id"]);

    let (_, list) = hub.call(Method::GET, "/api/reports", Some(owner), None).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_copy_report_endpoint() {
    let hub = TestHub::new();
    let owner = hub.register("owner@field.example", false).await;
    let well_id = hub.seed_well(owner).await;

    let (_, created) = hub
        .call(
            Method::POST,
            "/api/reports",
            Some(owner),
            Some(json!({ "title": "Base", "well_id": well_id, "pressure": 40.0 })),
        )
        .await;
    let external_id = id_of(&created, "external_id");

    let (status, copy) = hub
        .call(
            Method::POST,
            &format!("/api/reports/{external_id}/copy"),
            Some(owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{copy}");
    assert_eq!(copy["title"], "Base");
    assert_ne!(copy["external_id"], created["external_id"]);
    assert_eq!(copy["well_state_id"], created["well_state_id"]);
}

#[tokio::test]
async fn test_list_reports_rejects_inverted_date_window() {
    let hub = TestHub::new();
    let owner = hub.register("owner@field.example", false).await;

    let (status, body) = hub
        .call(
            Method::GET,
            "/api/reports?date_from=2024-02-01T00:00:00Z&date_to=2024-01-01T00:00:00Z",
            Some(owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_well_is_not_found() {
    let hub = TestHub::new();
    let owner = hub.register("owner@field.example", false).await;

    let (status, _) = hub
        .call(
            Method::POST,
            "/api/reports",
            Some(owner),
            Some(json!({ "well_id": Uuid::new_v4(), "depth": 1.0, "pressure": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_admin() {
    let hub = TestHub::new();
    let user = hub.register("user@field.example", false).await;
    let admin = hub.register("admin@field.example", true).await;
    let well_id = hub.seed_well(user).await;

    hub.call(
        Method::POST,
        "/api/reports",
        Some(user),
        Some(json!({ "well_id": well_id, "depth": 10.0, "pressure": 10.0 })),
    )
    .await;

    for uri in ["/api/admin/reports", "/api/admin/users"] {
        let (status, _) = hub.call(Method::GET, uri, Some(user), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "GET {uri} as non-admin");
    }

    let (status, reports) = hub
        .call(Method::GET, "/api/admin/reports", Some(admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reports.as_array().map(Vec::len), Some(1));

    let (status, users) = hub
        .call(Method::GET, "/api/admin/users", Some(admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(2));
}

// ============================================================================
// Limits
// ============================================================================

#[tokio::test]
async fn test_oversized_payload_rejected() {
    let hub = TestHub::with_config(HubConfig {
        passphrase: PASSPHRASE.to_string(),
        max_payload_size: 64,
        ..HubConfig::default()
    });

    let body = json!({ "email": format!("{}@field.example", "x".repeat(200)) }).to_string();
    let (status, _) = hub
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/users")
                .header(header::AUTHORIZATION, format!("Bearer {PASSPHRASE}"))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
