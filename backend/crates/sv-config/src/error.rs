use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("{category} error: {message} {location}")]
    Generic {
        category: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("User cache directory not found (set {var} to choose one)", var = crate::CONFIG_DIR_ENV)]
    NoCacheDir,
}

impl ConfigError {
    #[track_caller]
    fn generic<S: Into<String>>(category: &'static str, message: S) -> Self {
        ConfigError::Generic {
            category,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Create a config error
    #[track_caller]
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::generic("Config", message)
    }

    /// Create a daemon error
    #[track_caller]
    pub fn daemon<S: Into<String>>(message: S) -> Self {
        Self::generic("Daemon", message)
    }

    /// Create a supervisor error
    #[track_caller]
    pub fn supervisor<S: Into<String>>(message: S) -> Self {
        Self::generic("Supervisor", message)
    }

    /// Create a client error
    #[track_caller]
    pub fn client<S: Into<String>>(message: S) -> Self {
        Self::generic("Client", message)
    }

    /// Create a serde error
    #[track_caller]
    pub fn serde<S: Into<String>>(message: S) -> Self {
        Self::generic("Serde", message)
    }
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
