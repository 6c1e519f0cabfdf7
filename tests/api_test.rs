//! Router-level tests driven through `tower::ServiceExt::oneshot`, with
//! fake service backends behind the app state.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use graphsnap::api::models::{Credential, DashboardTarget, PageDestination};
use graphsnap::api::services::{check_credentials, check_schedule, health};
use graphsnap::api::state::AppState;
use graphsnap::browser::{BrowserError, PanelBrowser, PanelSession};
use graphsnap::capture::CaptureEngine;
use graphsnap::config::Config;
use graphsnap::confluence::{ConfluenceError, PageStore};
use graphsnap::credentials::CredentialChecker;
use graphsnap::grafana::{DashboardSource, GrafanaError, SnapshotHandle, TimeWindow};
use graphsnap::publish::PublishEngine;
use graphsnap::report::StageResult;
use graphsnap::schedule::ScheduleRunner;

/// Happy-path fake source with one dashboard, plus per-host ping failures
/// for the credential endpoint.
struct FakeSource {
    uid: String,
    fail_ping_hosts: HashSet<String>,
}

#[async_trait]
impl DashboardSource for FakeSource {
    async fn fetch_dashboard(
        &self,
        target: &DashboardTarget,
    ) -> Result<serde_json::Value, GrafanaError> {
        if target.uid != self.uid {
            return Err(GrafanaError::DashboardNotFound {
                uid: target.uid.clone(),
                host: target.host.clone(),
                port: target.port,
            });
        }
        Ok(json!({
            "title": "Service Overview",
            "panels": [{"id": 1, "title": "A"}, {"id": 2, "title": "B"}]
        }))
    }

    async fn create_snapshot(
        &self,
        _target: &DashboardTarget,
        _dashboard: &serde_json::Value,
        _window: TimeWindow,
        _expiry: DateTime<Utc>,
    ) -> Result<SnapshotHandle, GrafanaError> {
        Ok(SnapshotHandle {
            key: "snap-key".to_string(),
        })
    }

    async fn delete_snapshot(
        &self,
        _target: &DashboardTarget,
        _key: &str,
    ) -> Result<(), GrafanaError> {
        Ok(())
    }

    async fn login_ping(&self, host: &str, _port: u16, _auth: &Credential) -> StageResult {
        if self.fail_ping_hosts.contains(host) {
            StageResult::failure("Unauthorized")
        } else {
            StageResult::success()
        }
    }
}

struct FakeBrowser;

#[async_trait]
impl PanelBrowser for FakeBrowser {
    async fn login(
        &self,
        _base_url: &str,
        _auth: &Credential,
    ) -> Result<Box<dyn PanelSession>, BrowserError> {
        Ok(Box::new(FakeSession))
    }
}

struct FakeSession;

#[async_trait]
impl PanelSession for FakeSession {
    async fn panel_screenshot(&self, _url: &str, _panel_id: i64) -> Result<Bytes, BrowserError> {
        Ok(Bytes::from_static(b"png"))
    }

    async fn close(&self) {}
}

struct FakeStore;

#[async_trait]
impl PageStore for FakeStore {
    async fn page_exists(
        &self,
        _dest: &PageDestination,
        _page_id: &str,
    ) -> Result<bool, ConfluenceError> {
        Ok(true)
    }

    async fn find_child_page(
        &self,
        _dest: &PageDestination,
        _title: &str,
    ) -> Result<Option<String>, ConfluenceError> {
        Ok(None)
    }

    async fn create_page(
        &self,
        _dest: &PageDestination,
        _title: &str,
    ) -> Result<String, ConfluenceError> {
        Ok("page-1".to_string())
    }

    async fn upload_attachment(
        &self,
        _dest: &PageDestination,
        _page_id: &str,
        _name: &str,
        _image: Bytes,
    ) -> Result<(), ConfluenceError> {
        Ok(())
    }

    async fn access_mode(&self, _host: &str, _port: u16, _auth: &Credential) -> StageResult {
        StageResult::success()
    }
}

/// Builds a test app over fake backends.
fn build_test_app() -> Router {
    let config = Config::default();

    let source = Arc::new(FakeSource {
        uid: "abc123".to_string(),
        fail_ping_hosts: HashSet::from(["grafana-bad.internal".to_string()]),
    });
    let store = Arc::new(FakeStore);

    let capture = Arc::new(CaptureEngine::new(
        source.clone(),
        Arc::new(FakeBrowser),
        &config.capture,
    ));
    let publish = Arc::new(PublishEngine::new(store.clone()));
    let runner = ScheduleRunner::new(capture, publish, 2);
    let credentials = CredentialChecker::new(source, store);

    let state = AppState::new(config, runner, credentials);

    Router::new()
        .route("/schedule/check", axum::routing::post(check_schedule))
        .route("/credentials/check", axum::routing::post(check_credentials))
        .route("/health", axum::routing::get(health))
        .with_state(state)
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_schedule() -> Value {
    json!({
        "title": "api test",
        "dashboards": {
            "main": {
                "host": "grafana.internal",
                "port": 3000,
                "uid": "abc123",
                "auth": {"username": "u", "password": "p"}
            }
        },
        "destinations": {
            "wiki": {
                "host": "confluence.internal",
                "port": 8090,
                "space_key": "OPS",
                "top_page_id": "100",
                "auth": {"username": "u", "password": "p"}
            }
        }
    })
}

#[tokio::test]
async fn test_health_returns_ok() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_schedule_check_returns_complete_report() {
    let app = build_test_app();

    let response = app
        .oneshot(json_request("/schedule/check", valid_schedule()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["title"], "api test");
    assert!(!body["end_time"].is_null());

    let capture = &body["dashboards"]["main"]["capture"];
    assert_eq!(capture["dashboard_exists"]["succeeded"], true);
    assert_eq!(capture["ui_login"]["succeeded"], true);
    assert_eq!(capture["snapshot_delete"]["succeeded"], true);

    let publish = &body["dashboards"]["main"]["publish"]["wiki"];
    assert_eq!(publish["dashboard_page"]["succeeded"], true);
    assert_eq!(publish["panel_uploads"].as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_schedule_failures_still_answer_200() {
    let app = build_test_app();

    let mut request = valid_schedule();
    request["dashboards"]["main"]["uid"] = json!("no-such-uid");

    let response = app
        .oneshot(json_request("/schedule/check", request))
        .await
        .unwrap();

    // Failures are visible only inside the report body.
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let exists = &body["dashboards"]["main"]["capture"]["dashboard_exists"];
    assert_eq!(exists["succeeded"], false);
    assert!(
        exists["cause"]
            .as_str()
            .unwrap()
            .contains("no-such-uid")
    );
}

#[tokio::test]
async fn test_empty_schedule_is_rejected() {
    let app = build_test_app();

    let response = app
        .oneshot(json_request("/schedule/check", json!({"dashboards": {}})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = build_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/schedule/check")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_credential_check_preserves_order_and_never_aborts() {
    let app = build_test_app();

    let request = json!({
        "grafana": [
            {"host": "grafana-bad.internal", "port": 3000, "auth": {"token": "t1"}},
            {"host": "grafana-good.internal", "port": 3000, "auth": {"token": "t2"}}
        ],
        "confluence": [
            {"host": "confluence.internal", "port": 8090, "auth": {"username": "u", "password": "p"}}
        ]
    });

    let response = app
        .oneshot(json_request("/credentials/check", request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let grafana = body["grafana"].as_array().unwrap();
    assert_eq!(grafana.len(), 2);

    // The failing credential comes first and does not stop the second.
    assert_eq!(grafana[0]["host"], "grafana-bad.internal");
    assert_eq!(grafana[0]["succeeded"], false);
    assert_eq!(grafana[0]["cause"], "Unauthorized");
    assert_eq!(grafana[1]["succeeded"], true);

    let confluence = body["confluence"].as_array().unwrap();
    assert_eq!(confluence.len(), 1);
    assert_eq!(confluence[0]["succeeded"], true);
}
