use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use crate::core::{Config, ServerState};
use crate::registration::{ManualClock, RedbStore};
use crate::routes::build_app;

const T0: i64 = 1_700_000_000_000;

struct TestApp {
    app: Router,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let mut config = Config::with_overrides("/tmp/roster-api-test", 0);
        config.notify_webhook_url = None;
        let store = RedbStore::open_in_memory().unwrap();
        let state = ServerState::new(config, store, clock.clone()).unwrap();
        let app = build_app(&state).with_state(state);
        Self { app, clock }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn create(&self, id: &str, kind: &str, capacity: u32) {
        let (status, body) = self
            .post(
                "/api/resources",
                json!({ "id": id, "kind": kind, "name": id, "capacity": capacity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn register(&self, resource_id: &str, party_id: &str) -> (StatusCode, Value) {
        self.clock.advance(1);
        self.post(
            &format!("/api/resources/{resource_id}/registrations"),
            json!({ "party_id": party_id }),
        )
        .await
    }
}

#[tokio::test]
async fn health_reports_storage() {
    let t = TestApp::new();

    let (status, body) = t.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    t.create("spin", "CLASS", 2).await;
    let (status, body) = t.get("/health/detailed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["storage"]["status"], "ok");
    assert_eq!(body["checks"]["stats"]["resources"], 1);
}

#[tokio::test]
async fn class_registration_flow() {
    let t = TestApp::new();
    t.create("spin", "CLASS", 1).await;

    let (status, alice) = t.register("spin", "alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alice["status"], "CONFIRMED");

    let (status, bob) = t.register("spin", "bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bob["status"], "WAITLISTED");
    assert_eq!(bob["position"], 1);

    let (status, err) = t.register("spin", "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], 4003);

    let (_, waitlist) = t.get("/api/resources/spin/waitlist").await;
    assert_eq!(waitlist.as_array().unwrap().len(), 1);
    assert_eq!(waitlist[0]["party_id"], "bob");

    let (status, canceled) = t
        .send(Method::DELETE, "/api/resources/spin/registrations/alice", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(canceled["status"], "CANCELED");

    let (status, bob) = t.get("/api/resources/spin/registrations/bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bob["status"], "CONFIRMED");
    assert!(bob.get("position").is_none());

    let (_, resource) = t.get("/api/resources/spin").await;
    assert_eq!(resource["occupied"], 1);

    let (_, confirmed) = t.get("/api/resources/spin/entries?status=confirmed").await;
    assert_eq!(confirmed.as_array().unwrap().len(), 1);
    let (_, all) = t.get("/api/resources/spin/entries").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let t = TestApp::new();

    let (status, err) = t.get("/api/resources/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], 4001);

    let (status, _) = t.register("nope", "alice").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.create("spin", "CLASS", 1).await;
    let (status, err) = t.get("/api/resources/spin/registrations/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], 4004);

    let (status, _) = t.get("/api/resources/spin/entries?status=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send(
            Method::PUT,
            "/api/resources/spin",
            Some(json!({ "id": "other", "kind": "CLASS", "name": "x", "capacity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, err) = t
        .post(
            "/api/resources",
            json!({ "kind": "CLASS", "name": "Empty", "capacity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], 4007);
}

#[tokio::test]
async fn equipment_offer_is_claimed() {
    let t = TestApp::new();
    t.create("rower-1", "EQUIPMENT", 1).await;
    t.register("rower-1", "a").await;
    let (_, b) = t.register("rower-1", "b").await;
    assert_eq!(b["status"], "WAITLISTED");

    let (status, a) = t
        .post("/api/resources/rower-1/registrations/a/end", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(a["status"], "COMPLETED");

    let (_, b) = t.get("/api/resources/rower-1/registrations/b").await;
    assert_eq!(b["status"], "OFFERED");
    assert!(b["offer_expires_at"].as_i64().unwrap() > T0);

    let (status, b) = t
        .post("/api/resources/rower-1/registrations/b/claim", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(b["status"], "CONFIRMED");
}

#[tokio::test]
async fn canceled_class_rejects_registration() {
    let t = TestApp::new();
    t.create("yoga", "CLASS", 1).await;
    t.register("yoga", "alice").await;
    t.register("yoga", "bob").await;

    let (status, resource) = t.post("/api/resources/yoga/cancel", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resource["status"], "CANCELED");
    assert_eq!(resource["occupied"], 0);

    let (status, err) = t.register("yoga", "carol").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], 4002);

    let (_, entries) = t.get("/api/parties/bob/entries").await;
    assert_eq!(entries[0]["status"], "CANCELED");
}

#[tokio::test]
async fn command_replay_is_flagged_duplicate() {
    let t = TestApp::new();
    t.create("spin", "CLASS", 5).await;

    let cmd = json!({
        "command_id": "cmd-1",
        "operator_id": "app",
        "timestamp": T0,
        "payload": {
            "type": "REGISTER",
            "resource_id": "spin",
            "party_id": "alice",
            "party_name": "Alice"
        }
    });

    let (status, first) = t.post("/api/commands", cmd.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["duplicate"], false);
    assert_eq!(first["entry"]["status"], "CONFIRMED");

    let (_, replay) = t.post("/api/commands", cmd).await;
    assert_eq!(replay["duplicate"], true);
    assert_eq!(replay["entry"]["id"], first["entry"]["id"]);

    let (_, rejected) = t
        .post(
            "/api/commands",
            json!({
                "command_id": "cmd-2",
                "operator_id": "app",
                "timestamp": T0,
                "payload": { "type": "CANCEL", "resource_id": "spin", "party_id": "ghost" }
            }),
        )
        .await;
    assert_eq!(rejected["success"], false);
    assert_eq!(rejected["error"]["code"], "NOT_REGISTERED");
}

#[tokio::test]
async fn party_entries_span_resources() {
    let t = TestApp::new();
    t.create("spin", "CLASS", 1).await;
    t.create("yoga", "CLASS", 1).await;
    t.register("spin", "alice").await;
    t.register("yoga", "alice").await;

    let (status, entries) = t.get("/api/parties/alice/entries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn maintenance_endpoints() {
    let t = TestApp::new();
    t.create("spin", "CLASS", 1).await;
    t.register("spin", "alice").await;
    t.register("spin", "bob").await;

    let (status, report) = t.post("/api/resources/spin/reconcile", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["occupied_after"], 1);
    assert_eq!(report["positions_fixed"], 0);

    let (status, reports) = t.post("/api/reconcile", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reports.as_array().unwrap().len(), 1);

    let (status, promoted) = t.post("/api/resources/spin/promote", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(promoted.as_array().unwrap().is_empty());

    let (status, reorder) = t
        .post(
            "/api/resources/spin/waitlist/reorder",
            json!({ "from_position": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reorder["shifted"], 0);

    let (status, resource) = t.post("/api/resources/spin/complete", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resource["status"], "COMPLETED");
}
