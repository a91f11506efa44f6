use crate::{Action, StateKind};

use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    // Usage errors: surfaced to the caller, never retried
    #[error("action not allowed: cannot {action} while {state} {location}")]
    ActionNotAllowed {
        action: Action,
        state: StateKind,
        location: ErrorLocation,
    },

    #[error("Server already registered: {} {location}", path.display())]
    AlreadyRegistered {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Server not registered: {} {location}", path.display())]
    NotFound {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Server not initialized: {} has no .svctl directory {location}", path.display())]
    NotInitialized {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Server already initialized: {} already has a .svctl directory {location}", path.display())]
    AlreadyInitialized {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Invalid server path {}: {reason} {location}", path.display())]
    InvalidPath {
        path: PathBuf,
        reason: String,
        location: ErrorLocation,
    },

    // Process errors
    #[error("Process already running (PID {pid}) {location}")]
    AlreadyRunning { pid: u32, location: ErrorLocation },

    #[error("No process is running {location}")]
    NotRunning { location: ErrorLocation },

    #[error("Failed to spawn {}: {source} {location}", program.display())]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
        location: ErrorLocation,
    },

    #[error("Adoption of PID {pid} rejected: {reason} {location}")]
    AdoptionRejected {
        pid: u32,
        reason: String,
        location: ErrorLocation,
    },

    #[error("max restarts reached ({max} within {window_secs}s), last failure: {last_cause} {location}")]
    MaxRestartsReached {
        max: u32,
        window_secs: u64,
        last_cause: String,
        location: ErrorLocation,
    },

    // Collaborator errors: fatal, not subject to the restart budget
    #[error("Render failed: {message} {location}")]
    RenderFailed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Update failed: {message} {location}")]
    UpdateFailed {
        message: String,
        location: ErrorLocation,
    },

    // Persistence
    #[error("Persistence error at {}: {message} {location}", path.display())]
    Persistence {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error at {}: {source} {location}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
        location: ErrorLocation,
    },

    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },

    /// The error an instance recorded when it entered Errored.
    #[error(transparent)]
    Recorded(Arc<SupervisorError>),
}

impl SupervisorError {
    #[track_caller]
    pub fn action_not_allowed(action: Action, state: StateKind) -> Self {
        Self::ActionNotAllowed {
            action,
            state,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn already_registered(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyRegistered {
            path: path.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            path: path.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_initialized(path: impl Into<PathBuf>) -> Self {
        Self::NotInitialized {
            path: path.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn already_initialized(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyInitialized {
            path: path.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn already_running(pid: u32) -> Self {
        Self::AlreadyRunning {
            pid,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_running() -> Self {
        Self::NotRunning {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn spawn_failed(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source: Arc::new(source),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn adoption_rejected(pid: u32, reason: impl Into<String>) -> Self {
        Self::AdoptionRejected {
            pid,
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn max_restarts(max: u32, window_secs: u64, last_cause: impl Into<String>) -> Self {
        Self::MaxRestartsReached {
            max,
            window_secs,
            last_cause: last_cause.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn render_failed(message: impl Into<String>) -> Self {
        Self::RenderFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn update_failed(message: impl Into<String>) -> Self {
        Self::UpdateFailed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn persistence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The underlying error, looking through `Recorded`.
    pub fn root(&self) -> &SupervisorError {
        match self {
            Self::Recorded(inner) => inner.root(),
            other => other,
        }
    }

    /// Process failures that the restart loop absorbs.
    pub fn is_transient(&self) -> bool {
        matches!(self.root(), Self::SpawnFailed { .. })
    }

    /// Mistakes by the caller; retrying the same request will not help.
    pub fn is_usage(&self) -> bool {
        matches!(
            self.root(),
            Self::ActionNotAllowed { .. }
                | Self::AlreadyRegistered { .. }
                | Self::NotFound { .. }
                | Self::NotInitialized { .. }
                | Self::AlreadyInitialized { .. }
                | Self::InvalidPath { .. }
        )
    }

    /// Stable code for the control surface.
    pub fn error_code(&self) -> &'static str {
        match self.root() {
            Self::ActionNotAllowed { .. } => "ACTION_NOT_ALLOWED",
            Self::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NotInitialized { .. } => "NOT_INITIALIZED",
            Self::AlreadyInitialized { .. } => "ALREADY_INITIALIZED",
            Self::InvalidPath { .. } => "INVALID_PATH",
            Self::AlreadyRunning { .. } => "ALREADY_RUNNING",
            Self::NotRunning { .. } => "NOT_RUNNING",
            Self::SpawnFailed { .. } => "SPAWN_FAILED",
            Self::AdoptionRejected { .. } => "ADOPTION_REJECTED",
            Self::MaxRestartsReached { .. } => "MAX_RESTARTS",
            Self::RenderFailed { .. } => "RENDER_FAILED",
            Self::UpdateFailed { .. } => "UPDATE_FAILED",
            Self::Persistence { .. } | Self::Io { .. } | Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Recorded(_) => "INTERNAL_ERROR",
        }
    }

    /// Message without the source location, for clients and status snapshots.
    pub fn summary(&self) -> String {
        match self.root() {
            Self::ActionNotAllowed { action, state, .. } => {
                format!("action not allowed: cannot {action} while {state}")
            }
            Self::AlreadyRegistered { path, .. } => {
                format!("server already registered: {}", path.display())
            }
            Self::NotFound { path, .. } => format!("server not registered: {}", path.display()),
            Self::NotInitialized { path, .. } => {
                format!("server not initialized: {} has no .svctl directory", path.display())
            }
            Self::AlreadyInitialized { path, .. } => {
                format!("server already initialized: {} already has a .svctl directory", path.display())
            }
            Self::InvalidPath { path, reason, .. } => {
                format!("invalid server path {}: {reason}", path.display())
            }
            Self::AlreadyRunning { pid, .. } => format!("process already running (PID {pid})"),
            Self::NotRunning { .. } => "no process is running".to_string(),
            Self::SpawnFailed {
                program, source, ..
            } => format!("failed to spawn {}: {source}", program.display()),
            Self::AdoptionRejected { pid, reason, .. } => {
                format!("adoption of PID {pid} rejected: {reason}")
            }
            Self::MaxRestartsReached {
                max,
                window_secs,
                last_cause,
                ..
            } => format!(
                "max restarts reached ({max} within {window_secs}s), last failure: {last_cause}"
            ),
            Self::RenderFailed { message, .. } => format!("render failed: {message}"),
            Self::UpdateFailed { message, .. } => format!("update failed: {message}"),
            Self::Persistence { path, message, .. } => {
                format!("persistence error at {}: {message}", path.display())
            }
            Self::Io { path, source, .. } => format!("IO error at {}: {source}", path.display()),
            Self::Internal { message, .. } => format!("internal error: {message}"),
            Self::Recorded(inner) => inner.summary(),
        }
    }

    /// Short advice shown next to the error by the CLI.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::ActionNotAllowed { .. } => Some("Check the server state with `svctl status`"),
            Self::NotFound { .. } => Some("Register the server first with `svctl register`"),
            Self::NotInitialized { .. } => Some("Initialize the server first with `svctl init`"),
            Self::AlreadyInitialized { .. } => {
                Some("Remove the .svctl directory before initializing again")
            }
            Self::MaxRestartsReached { .. } => {
                Some("Inspect the server logs, then run `svctl reset` or `svctl stop`")
            }
            Self::RenderFailed { .. } | Self::UpdateFailed { .. } => {
                Some("Fix the instance configuration, then run `svctl reset`")
            }
            Self::SpawnFailed { .. } => Some("Check that the server executable exists"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
