pub mod api;
pub mod error;
pub mod health;
pub mod logger;
pub mod routes;
pub mod state;

#[cfg(test)]
mod tests;

pub use api::{
    error::ApiError,
    error::Result as ApiResult,
    servers::{
        server_dto::ServerDto,
        server_list_response::ServerListResponse,
        server_request::{ServerQuery, ServerRequest},
        server_response::ServerResponse,
        servers::{
            get_server_status, list_servers, register_server, reset_server, restart_server,
            start_server, stop_server,
        },
    },
};
pub use error::{DaemonError, Result as DaemonResult};
pub use state::AppState;

pub use crate::routes::build_router;
