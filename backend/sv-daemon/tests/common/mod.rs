#![allow(dead_code)]

//! Test infrastructure for sv-daemon API tests

use sv_config::{SupervisorConfig, UpdateCheckPolicy};
use sv_core::{
    FileStore, INSTANCE_DIR, InstanceFactory, InstanceParts, LaunchSpec, NoopRenderer,
    NoopUpdater, SupervisorRegistry, SupervisorResult,
};
use sv_daemon::AppState;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

/// Runs `sleep 30` in place of the dedicated server.
pub struct SleepFactory;

impl InstanceFactory for SleepFactory {
    fn build(&self, path: &Path) -> SupervisorResult<InstanceParts> {
        Ok(InstanceParts {
            launch: LaunchSpec::new(sleep_binary(), path).arg("30"),
            renderer: Arc::new(NoopRenderer),
            updater: Arc::new(NoopUpdater),
        })
    }
}

pub fn sleep_binary() -> PathBuf {
    ["/bin/sleep", "/usr/bin/sleep"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap_or_else(|| PathBuf::from("sleep"))
}

pub fn test_config() -> SupervisorConfig {
    SupervisorConfig {
        max_restarts: 3,
        restart_window_secs: 60,
        stop_grace_ms: 50,
        kill_timeout_secs: 2,
        health_interval_ms: 50,
        render_interval_secs: 3600,
        update_check: UpdateCheckPolicy::Never,
    }
}

/// AppState over a fresh state file. Keep the TempDir alive for the test.
pub fn create_test_app_state() -> (AppState, TempDir) {
    let state_dir = TempDir::new().expect("Failed to create state dir");
    let registry = SupervisorRegistry::new(
        Arc::new(SleepFactory),
        Arc::new(FileStore::new(state_dir.path().join("state.json"))),
        test_config(),
    );

    (AppState::new(Arc::new(registry)), state_dir)
}

/// Temp directory laid out as an initialized server installation.
pub fn create_test_server() -> TempDir {
    let server = TempDir::new().expect("Failed to create server dir");
    std::fs::create_dir(server.path().join(INSTANCE_DIR)).expect("Failed to create .svctl");
    server
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send one request and decode the JSON answer.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn path_body(path: &Path) -> serde_json::Value {
    serde_json::json!({ "path": path })
}
