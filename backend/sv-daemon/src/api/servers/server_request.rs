use crate::{ApiError, ApiResult};

use std::path::PathBuf;

use serde::Deserialize;

/// Body of every lifecycle action
#[derive(Debug, Deserialize)]
pub struct ServerRequest {
    /// Absolute path of the server installation
    pub path: PathBuf,
}

/// `?path=..` of the status lookup
#[derive(Debug, Deserialize)]
pub struct ServerQuery {
    pub path: PathBuf,
}

impl ServerRequest {
    /// The daemon's working directory means nothing to the caller, so
    /// relative paths are refused.
    pub fn into_path(self) -> ApiResult<PathBuf> {
        require_absolute(self.path)
    }
}

impl ServerQuery {
    pub fn into_path(self) -> ApiResult<PathBuf> {
        require_absolute(self.path)
    }
}

fn require_absolute(path: PathBuf) -> ApiResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ApiError::bad_request("INVALID_PATH", "path must not be empty"));
    }
    if !path.is_absolute() {
        return Err(ApiError::bad_request(
            "INVALID_PATH",
            format!("path must be absolute: {}", path.display()),
        ));
    }
    Ok(path)
}
