use crate::ServerDto;

use sv_core::InstanceStatus;

use serde::Serialize;

/// Single server response
#[derive(Debug, Serialize)]
pub struct ServerResponse {
    pub server: ServerDto,
}

impl From<InstanceStatus> for ServerResponse {
    fn from(status: InstanceStatus) -> Self {
        Self {
            server: status.into(),
        }
    }
}
