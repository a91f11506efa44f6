//! Integration tests for server lifecycle API handlers
mod common;

use crate::common::{
    create_test_app_state, create_test_server, get, path_body, post_json, send,
};

use axum::http::StatusCode;
use tempfile::TempDir;

use sv_daemon::routes::build_router;

fn canonical(dir: &TempDir) -> String {
    dir.path().canonicalize().unwrap().display().to_string()
}

#[tokio::test]
async fn test_health_reports_server_count() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["servers"], 0);
}

#[tokio::test]
async fn test_list_servers_empty() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);

    let (status, json) = send(&app, get("/api/v1/servers")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["servers"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_register_server_returns_stopped_status() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);
    let server = create_test_server();

    let (status, json) = send(
        &app,
        post_json("/api/v1/servers/register", path_body(server.path())),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["server"]["path"], canonical(&server));
    assert_eq!(json["server"]["state"], "stopped");
    assert!(json["server"]["pid"].is_null());
    assert_eq!(json["server"]["restarts"], 0);
}

#[tokio::test]
async fn test_register_twice_returns_409() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);
    let server = create_test_server();
    let body = path_body(server.path());
    send(&app, post_json("/api/v1/servers/register", body.clone())).await;

    let (status, json) = send(&app, post_json("/api/v1/servers/register", body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "ALREADY_REGISTERED");
}

#[tokio::test]
async fn test_register_uninitialized_directory_returns_400() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);
    let plain = TempDir::new().unwrap();

    let (status, json) = send(
        &app,
        post_json("/api/v1/servers/register", path_body(plain.path())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "NOT_INITIALIZED");
}

#[tokio::test]
async fn test_register_relative_path_returns_400() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);

    let (status, json) = send(
        &app,
        post_json(
            "/api/v1/servers/register",
            serde_json::json!({ "path": "servers/pr" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_PATH");
}

#[tokio::test]
async fn test_malformed_body_returns_400_json_error() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);

    let (status, json) = send(
        &app,
        post_json("/api/v1/servers/start", serde_json::json!({ "where": "/srv" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_start_unregistered_returns_404() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);
    let server = create_test_server();

    let (status, json) = send(
        &app,
        post_json("/api/v1/servers/start", path_body(server.path())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_unknown_path_returns_404() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);

    let (status, json) = send(&app, get("/api/v1/servers/status?path=/definitely/missing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_reset_stopped_server_returns_409() {
    let (state, _state_dir) = create_test_app_state();
    let app = build_router(state);
    let server = create_test_server();
    let body = path_body(server.path());
    send(&app, post_json("/api/v1/servers/register", body.clone())).await;

    let (status, json) = send(&app, post_json("/api/v1/servers/reset", body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "ACTION_NOT_ALLOWED");
}

#[cfg(unix)]
mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_start_status_stop_round() {
        // Given
        let (state, _state_dir) = create_test_app_state();
        let app = build_router(state);
        let server = create_test_server();
        let body = path_body(server.path());
        send(&app, post_json("/api/v1/servers/register", body.clone())).await;

        // When
        let (status, started) = send(&app, post_json("/api/v1/servers/start", body.clone())).await;

        // Then
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["server"]["state"], "running");
        let pid = started["server"]["pid"].as_u64().unwrap();

        let uri = format!("/api/v1/servers/status?path={}", canonical(&server));
        let (status, current) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(current["server"]["pid"].as_u64(), Some(pid));

        let (status, again) = send(&app, post_json("/api/v1/servers/start", body.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(again["error"]["code"], "ACTION_NOT_ALLOWED");

        let (status, stopped) = send(&app, post_json("/api/v1/servers/stop", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stopped["server"]["state"], "stopped");
        assert!(stopped["server"]["pid"].is_null());
    }

    #[tokio::test]
    async fn test_restart_replaces_process() {
        let (state, _state_dir) = create_test_app_state();
        let app = build_router(state);
        let server = create_test_server();
        let body = path_body(server.path());
        send(&app, post_json("/api/v1/servers/register", body.clone())).await;
        let (_, started) = send(&app, post_json("/api/v1/servers/start", body.clone())).await;

        let (status, restarted) = send(&app, post_json("/api/v1/servers/restart", body.clone())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(restarted["server"]["state"], "running");
        assert_ne!(restarted["server"]["pid"], started["server"]["pid"]);
        assert_eq!(restarted["server"]["restarts"], 0);

        send(&app, post_json("/api/v1/servers/stop", body)).await;
    }

    #[tokio::test]
    async fn test_list_servers_sorted_by_path() {
        let (state, _state_dir) = create_test_app_state();
        let app = build_router(state);
        let first = create_test_server();
        let second = create_test_server();
        send(&app, post_json("/api/v1/servers/register", path_body(second.path()))).await;
        send(&app, post_json("/api/v1/servers/register", path_body(first.path()))).await;

        let (status, json) = send(&app, get("/api/v1/servers")).await;

        assert_eq!(status, StatusCode::OK);
        let paths: Vec<_> = json["servers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["path"].as_str().unwrap().to_string())
            .collect();
        let mut expected = vec![canonical(&first), canonical(&second)];
        expected.sort();
        assert_eq!(paths, expected);
    }
}
