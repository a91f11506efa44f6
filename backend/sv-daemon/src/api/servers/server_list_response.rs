use crate::ServerDto;

use serde::Serialize;

/// List of servers response
#[derive(Debug, Serialize)]
pub struct ServerListResponse {
    pub servers: Vec<ServerDto>,
}
