//! Integration tests for the REST/session core against a stub WSAPI

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use coral_client::{ClientError, CoralClient, ErrorKind, WSAPI_MIN_BUILD};
use coral_core::config::{ClientConfig, RetryConfig};

/// Shared observable state of the stub array
#[derive(Default)]
struct StubState {
    login_count: AtomicU32,
    volume_requests: AtomicU32,
    current_key: tokio::sync::Mutex<Option<String>>,
}

#[derive(Clone)]
struct Stub {
    state: Arc<StubState>,
    build: u32,
    always_unavailable: bool,
}

async fn version(State(stub): State<Stub>) -> Json<Value> {
    Json(json!({
        "major": 1,
        "minor": 6,
        "revision": 0,
        "build": stub.build,
    }))
}

async fn login(State(stub): State<Stub>) -> Json<Value> {
    let n = stub.state.login_count.fetch_add(1, Ordering::SeqCst) + 1;
    let key = format!("session-{n}");
    *stub.state.current_key.lock().await = Some(key.clone());
    Json(json!({ "key": key }))
}

async fn logout(State(stub): State<Stub>, Path(key): Path<String>) -> StatusCode {
    let mut current = stub.state.current_key.lock().await;
    if current.as_deref() == Some(key.as_str()) {
        *current = None;
    }
    StatusCode::OK
}

async fn volumes(State(stub): State<Stub>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    stub.state.volume_requests.fetch_add(1, Ordering::SeqCst);

    if stub.always_unavailable {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "code": 99, "desc": "array undergoing maintenance" })),
        );
    }

    let provided = headers
        .get("X-CoralStor-Session-Key")
        .and_then(|v| v.to_str().ok());
    let current = stub.state.current_key.lock().await;
    if provided.is_some() && provided == current.as_deref() {
        (
            StatusCode::OK,
            Json(json!({
                "total": 2,
                "members": [{ "name": "vol1" }, { "name": "vol2" }],
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": 6, "desc": "invalid session key" })),
        )
    }
}

/// Start the stub and return its versioned base URL plus the state handle
async fn spawn_stub(build: u32, always_unavailable: bool) -> (String, Arc<StubState>) {
    let state = Arc::new(StubState::default());
    let stub = Stub {
        state: Arc::clone(&state),
        build,
        always_unavailable,
    };

    let app = Router::new()
        .route("/api", get(version))
        .route("/api/v1/credentials", post(login))
        .route("/api/v1/credentials/:key", delete(logout))
        .route("/api/v1/volumes", get(volumes))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api/v1"), state)
}

fn config_for(api_url: &str, tries: u32) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.rest.api_url = api_url.to_string();
    config.rest.retry = RetryConfig {
        tries,
        ..RetryConfig::default()
    };
    config
}

#[tokio::test]
async fn test_login_list_logout_then_reauth() {
    let (api_url, state) = spawn_stub(WSAPI_MIN_BUILD, false).await;
    let client = CoralClient::connect(config_for(&api_url, 5)).await.unwrap();

    client.login("user", "pass", None).await.unwrap();
    assert_eq!(state.login_count.load(Ordering::SeqCst), 1);

    let listing = client.get_volumes().await.unwrap();
    assert_eq!(listing["total"], json!(2));
    assert_eq!(listing["members"].as_array().unwrap().len(), 2);

    client.logout().await.unwrap();

    // The session is gone; the next call must re-authenticate exactly once
    // and then succeed.
    let listing = client.get_volumes().await.unwrap();
    assert_eq!(listing["total"], json!(2));
    assert_eq!(state.login_count.load(Ordering::SeqCst), 2);

    // First get, then the rejected get plus its replay after re-auth.
    assert_eq!(state.volume_requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_exhaustion_surfaces_last_error() {
    let (api_url, state) = spawn_stub(WSAPI_MIN_BUILD, true).await;
    let client = CoralClient::connect(config_for(&api_url, 3)).await.unwrap();

    let err = client.get_volumes().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);

    // Exactly as many attempts as the configured budget.
    assert_eq!(state.volume_requests.load(Ordering::SeqCst), 3);

    let ClientError::ServiceUnavailable(details) = err else {
        panic!("expected ServiceUnavailable");
    };
    assert_eq!(details.code, Some(99));
    assert_eq!(
        details.description.as_deref(),
        Some("array undergoing maintenance")
    );
}

#[tokio::test]
async fn test_version_gate_rejects_old_build() {
    let (api_url, _state) = spawn_stub(WSAPI_MIN_BUILD - 1, false).await;

    let err = CoralClient::connect(config_for(&api_url, 5)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    let ClientError::UnsupportedVersion { build, minimum } = err else {
        panic!("expected UnsupportedVersion");
    };
    assert_eq!(build, WSAPI_MIN_BUILD - 1);
    assert_eq!(minimum, WSAPI_MIN_BUILD);
}

#[tokio::test]
async fn test_timing_instrumentation() {
    let (api_url, _state) = spawn_stub(WSAPI_MIN_BUILD, false).await;
    let client = CoralClient::connect(config_for(&api_url, 5)).await.unwrap();

    // The construction-time version probe is already recorded.
    let timings = client.rest().timings().await;
    assert_eq!(timings.len(), 1);

    client.rest().reset_timings().await;
    client.login("user", "pass", None).await.unwrap();
    client.get_volumes().await.unwrap();

    let timings = client.rest().timings().await;
    assert_eq!(timings.len(), 2);
    assert!(timings[0].label.starts_with("POST "));
    assert!(timings[1].label.starts_with("GET "));
    for timing in &timings {
        assert!(timing.finish >= timing.start);
    }

    client.rest().reset_timings().await;
    assert!(client.rest().timings().await.is_empty());
}

#[tokio::test]
async fn test_auth_failure_without_credentials_surfaces() {
    let (api_url, state) = spawn_stub(WSAPI_MIN_BUILD, false).await;
    let client = CoralClient::connect(config_for(&api_url, 5)).await.unwrap();

    // Never logged in: there is nothing to re-auth with, so the 401
    // surfaces directly.
    let err = client.get_volumes().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(state.login_count.load(Ordering::SeqCst), 0);
}
