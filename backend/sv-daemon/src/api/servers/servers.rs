//! Server lifecycle REST API handlers
//!
//! Each action runs in its own task. A client that times out or hangs up
//! does not cancel a transition halfway.

use crate::{
    ApiResult, AppState, ServerDto, ServerListResponse, ServerQuery, ServerRequest,
    ServerResponse,
};

use sv_core::SupervisorRegistry;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum ServerAction {
    Register,
    Start,
    Stop,
    Restart,
    Reset,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/v1/servers/register
pub async fn register_server(
    State(state): State<AppState>,
    payload: Result<Json<ServerRequest>, JsonRejection>,
) -> ApiResult<Json<ServerResponse>> {
    perform(&state, ServerAction::Register, payload).await
}

/// POST /api/v1/servers/start
pub async fn start_server(
    State(state): State<AppState>,
    payload: Result<Json<ServerRequest>, JsonRejection>,
) -> ApiResult<Json<ServerResponse>> {
    perform(&state, ServerAction::Start, payload).await
}

/// POST /api/v1/servers/stop
pub async fn stop_server(
    State(state): State<AppState>,
    payload: Result<Json<ServerRequest>, JsonRejection>,
) -> ApiResult<Json<ServerResponse>> {
    perform(&state, ServerAction::Stop, payload).await
}

/// POST /api/v1/servers/restart
///
/// Planned restart; does not count against the restart budget.
pub async fn restart_server(
    State(state): State<AppState>,
    payload: Result<Json<ServerRequest>, JsonRejection>,
) -> ApiResult<Json<ServerResponse>> {
    perform(&state, ServerAction::Restart, payload).await
}

/// POST /api/v1/servers/reset
pub async fn reset_server(
    State(state): State<AppState>,
    payload: Result<Json<ServerRequest>, JsonRejection>,
) -> ApiResult<Json<ServerResponse>> {
    perform(&state, ServerAction::Reset, payload).await
}

/// GET /api/v1/servers/status?path=..
pub async fn get_server_status(
    State(state): State<AppState>,
    query: Result<Query<ServerQuery>, QueryRejection>,
) -> ApiResult<Json<ServerResponse>> {
    let Query(query) = query?;
    let path = query.into_path()?;

    let status = state.registry.status(&path).await?;
    Ok(Json(status.into()))
}

/// GET /api/v1/servers
pub async fn list_servers(State(state): State<AppState>) -> Json<ServerListResponse> {
    let servers = state.registry.list().await;

    Json(ServerListResponse {
        servers: servers.into_iter().map(ServerDto::from).collect(),
    })
}

// =============================================================================
// Helpers
// =============================================================================

async fn perform(
    state: &AppState,
    action: ServerAction,
    payload: Result<Json<ServerRequest>, JsonRejection>,
) -> ApiResult<Json<ServerResponse>> {
    let Json(request) = payload?;
    let path = request.into_path()?;
    debug!(?action, path = %path.display(), "Server action requested");

    let registry = Arc::clone(&state.registry);
    let status = tokio::spawn(run(registry, action, path)).await??;

    Ok(Json(status.into()))
}

async fn run(
    registry: Arc<SupervisorRegistry>,
    action: ServerAction,
    path: PathBuf,
) -> sv_core::SupervisorResult<sv_core::InstanceStatus> {
    match action {
        ServerAction::Register => registry.register(&path).await,
        ServerAction::Start => registry.start(&path).await,
        ServerAction::Stop => registry.stop(&path).await,
        ServerAction::Restart => registry.restart(&path).await,
        ServerAction::Reset => registry.reset(&path).await,
    }
}
