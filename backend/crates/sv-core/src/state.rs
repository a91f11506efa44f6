use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an instance without its per-state data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Stopped,
    Running,
    Restarting,
    Errored,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::Stopped => "stopped",
            StateKind::Running => "running",
            StateKind::Restarting => "restarting",
            StateKind::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Snapshot of one instance, published on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub path: PathBuf,
    pub state: StateKind,
    pub pid: Option<u32>,
    /// Unplanned restarts in the current window
    pub restarts: u32,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl InstanceStatus {
    pub fn stopped(path: PathBuf) -> Self {
        Self {
            path,
            state: StateKind::Stopped,
            pid: None,
            restarts: 0,
            last_error: None,
            updated_at: Utc::now(),
        }
    }
}
