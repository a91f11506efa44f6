use sv_core::SupervisorError;

use std::panic::Location;
use std::path::PathBuf;
use std::time::Duration;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors that can occur during API calls
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request error: {message} {location}")]
    Http {
        message: String,
        location: ErrorLocation,
        #[source]
        source: reqwest::Error,
    },

    /// The daemon did not answer in time. It keeps working on the action.
    #[error(
        "No answer from the daemon within {}s; the action continues on the daemon, check with `svctl status` {location}",
        timeout.as_secs()
    )]
    Timeout {
        timeout: Duration,
        location: ErrorLocation,
    },

    #[error("API error: {message} (code: {code}) {location}")]
    Api {
        code: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("JSON parse error: {message} {location}")]
    Json {
        message: String,
        location: ErrorLocation,
        #[source]
        source: serde_json::Error,
    },

    /// A local operation on a server installation failed.
    #[error("{message} (code: {code}) {location}")]
    Instance {
        code: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid server path {}: {message} {location}", path.display())]
    Path {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },
}

impl ClientError {
    /// Convert reqwest error with context
    #[track_caller]
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        ClientError::Http {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    /// Convert JSON error with context
    #[track_caller]
    pub fn from_json(err: serde_json::Error) -> Self {
        ClientError::Json {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: err,
        }
    }

    #[track_caller]
    pub fn timeout(timeout: Duration) -> Self {
        ClientError::Timeout {
            timeout,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create an API error with location
    #[track_caller]
    pub fn api_error(code: String, message: String) -> Self {
        ClientError::Api {
            code,
            message,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ClientError::Path {
            path: path.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Code reported by the daemon or by a local instance operation
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } | ClientError::Instance { code, .. } => {
                Some(code.as_str())
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        ClientError::from_reqwest(err)
    }
}

impl From<serde_json::Error> for ClientError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        ClientError::from_json(err)
    }
}

impl From<SupervisorError> for ClientError {
    #[track_caller]
    fn from(err: SupervisorError) -> Self {
        ClientError::Instance {
            code: err.error_code().to_string(),
            message: err.summary(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
