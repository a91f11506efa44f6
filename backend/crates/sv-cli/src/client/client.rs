use crate::{CliClientResult, ClientError};

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct ServerRequest<'a> {
    path: &'a Path,
}

/// HTTP client for the svctl daemon REST API
pub struct Client {
    pub base_url: String,
    pub timeout: Duration,
    client: ReqwestClient,
}

impl Client {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Daemon URL (e.g., "http://127.0.0.1:50051")
    /// * `timeout` - How long to wait for each answer
    pub fn new(base_url: &str, timeout: Duration) -> CliClientResult<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url)
    }

    /// Execute request and handle errors
    async fn execute(&self, req: reqwest::RequestBuilder) -> CliClientResult<Value> {
        let response = req.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let error = body.get("error");
            let code = error
                .and_then(|e| e.get("code"))
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_string();
            let message = error
                .and_then(|e| e.get("message"))
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(|| format!("daemon answered {status}"));
            return Err(ClientError::api_error(code, message));
        }

        Ok(body)
    }

    #[track_caller]
    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::timeout(self.timeout)
        } else {
            ClientError::from_reqwest(err)
        }
    }

    async fn post_action(&self, action: &str, path: &Path) -> CliClientResult<Value> {
        let req = self
            .request(Method::POST, &format!("/api/v1/servers/{action}"))
            .json(&ServerRequest { path });
        self.execute(req).await
    }

    // =========================================================================
    // Server Operations
    // =========================================================================

    /// Register the server installed at `path`
    pub async fn register(&self, path: &Path) -> CliClientResult<Value> {
        self.post_action("register", path).await
    }

    pub async fn start(&self, path: &Path) -> CliClientResult<Value> {
        self.post_action("start", path).await
    }

    pub async fn stop(&self, path: &Path) -> CliClientResult<Value> {
        self.post_action("stop", path).await
    }

    /// Planned restart
    pub async fn restart(&self, path: &Path) -> CliClientResult<Value> {
        self.post_action("restart", path).await
    }

    /// Clear an errored server back to stopped
    pub async fn reset(&self, path: &Path) -> CliClientResult<Value> {
        self.post_action("reset", path).await
    }

    pub async fn status(&self, path: &Path) -> CliClientResult<Value> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/api/v1/servers/status", self.base_url),
            &[("path", path.to_string_lossy())],
        )
        .map_err(|e| ClientError::path(path, e.to_string()))?;
        self.execute(self.client.get(url)).await
    }

    /// All registered servers
    pub async fn list(&self) -> CliClientResult<Value> {
        let req = self.request(Method::GET, "/api/v1/servers");
        self.execute(req).await
    }
}

/// Absolute form of `--path`, defaulting to the current directory.
///
/// The path is not canonicalized; the daemon does that and reports
/// missing directories itself.
pub fn resolve_path(path: Option<&Path>) -> CliClientResult<PathBuf> {
    let path = path.unwrap_or(Path::new("."));
    std::path::absolute(path).map_err(|e| ClientError::path(path, e.to_string()))
}
