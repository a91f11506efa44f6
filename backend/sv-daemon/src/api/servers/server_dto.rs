use sv_core::{InstanceStatus, StateKind};

use serde::{Deserialize, Serialize};

/// Server status as sent over the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDto {
    pub path: String,
    pub state: StateKind,
    pub pid: Option<u32>,
    /// Unplanned restarts in the current window
    pub restarts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// RFC 3339
    pub updated_at: String,
}

impl From<InstanceStatus> for ServerDto {
    fn from(status: InstanceStatus) -> Self {
        Self {
            path: status.path.display().to_string(),
            state: status.state,
            pid: status.pid,
            restarts: status.restarts,
            last_error: status.last_error,
            updated_at: status.updated_at.to_rfc3339(),
        }
    }
}
