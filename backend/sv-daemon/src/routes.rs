use crate::{
    AppState, get_server_status, health, list_servers, register_server, reset_server,
    restart_server, start_server, stop_server,
};

use axum::{
    Router,
    routing::{get, post},
};

/// Build the application router with all endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health", get(health::health_check))
        .route("/live", get(health::liveness_check))
        // Server lifecycle
        .route("/api/v1/servers", get(list_servers))
        .route("/api/v1/servers/status", get(get_server_status))
        .route("/api/v1/servers/register", post(register_server))
        .route("/api/v1/servers/start", post(start_server))
        .route("/api/v1/servers/stop", post(stop_server))
        .route("/api/v1/servers/restart", post(restart_server))
        .route("/api/v1/servers/reset", post(reset_server))
        .with_state(state)
}
