use crate::ApiError;

use sv_core::{Action, StateKind, SupervisorError};

use std::panic::Location;

use axum::response::IntoResponse;
use error_location::ErrorLocation;
use googletest::assert_that;
use googletest::prelude::eq;
use http::StatusCode;
use http_body_util::BodyExt;

async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
    let response = error.into_response();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_not_found_returns_404_with_json_body() {
    let error = ApiError::NotFound {
        message: "server not registered: /srv/pr".into(),
        location: ErrorLocation::from(Location::caller()),
    };

    let (status, json) = body_json(error).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(json["error"]["message"], "server not registered: /srv/pr");
}

#[tokio::test]
async fn test_action_not_allowed_maps_to_409() {
    let error = ApiError::from(SupervisorError::action_not_allowed(
        Action::Start,
        StateKind::Running,
    ));

    let (status, json) = body_json(error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "ACTION_NOT_ALLOWED");
    assert_eq!(
        json["error"]["message"],
        "action not allowed: cannot start while running"
    );
}

#[tokio::test]
async fn test_already_registered_maps_to_409() {
    let error = ApiError::from(SupervisorError::already_registered("/srv/pr"));

    assert_that!(error.status(), eq(StatusCode::CONFLICT));
}

#[tokio::test]
async fn test_already_initialized_maps_to_409() {
    let error = ApiError::from(SupervisorError::already_initialized("/srv/pr"));

    let (status, json) = body_json(error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "ALREADY_INITIALIZED");
}

#[tokio::test]
async fn test_path_errors_map_to_400() {
    let not_initialized = ApiError::from(SupervisorError::not_initialized("/srv/pr"));
    let invalid = ApiError::from(SupervisorError::invalid_path("/srv/pr", "not a directory"));

    let (status, json) = body_json(not_initialized).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "NOT_INITIALIZED");

    assert_that!(invalid.status(), eq(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_adoption_rejected_maps_to_422() {
    let error = ApiError::from(SupervisorError::adoption_rejected(4242, "process is not running"));

    let (status, json) = body_json(error).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "ADOPTION_REJECTED");
}

#[tokio::test]
async fn test_render_failure_maps_to_500_with_code() {
    let error = ApiError::from(SupervisorError::render_failed("template broken"));

    let (status, json) = body_json(error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "RENDER_FAILED");
    assert_eq!(json["error"]["message"], "render failed: template broken");
}

#[tokio::test]
async fn test_recorded_error_keeps_its_code() {
    let recorded = SupervisorError::Recorded(std::sync::Arc::new(SupervisorError::max_restarts(
        5,
        60,
        "process exited (exit status: 1)",
    )));

    let (status, json) = body_json(ApiError::from(recorded)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "MAX_RESTARTS");
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("max restarts reached (5 within 60s)")
    );
}

#[tokio::test]
async fn test_message_never_contains_location() {
    let error = ApiError::from(SupervisorError::not_found("/srv/pr"));

    let (_, json) = body_json(error).await;

    assert!(!json["error"]["message"].as_str().unwrap().contains(".rs:"));
}
