use crate::process::os;
use crate::render::tail;
use crate::{SupervisorError, SupervisorResult};

use std::cmp::Ordering;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::info;

const MOD_DESC_PATH: &str = "mods/pr/mod.desc";
const UPDATER_DIR: &str = "mods/pr/bin";
#[cfg(not(windows))]
const UPDATER_EXE: &str = "prserverupdater-linux64";
#[cfg(windows)]
const UPDATER_EXE: &str = "prserverupdater-win32.exe";

const OUTPUT_TAIL_BYTES: usize = 512;

/// Brings the server installation up to date between restarts.
#[async_trait]
pub trait Updater: Send + Sync {
    async fn is_new_version_available(&self) -> SupervisorResult<bool>;

    async fn update(&self) -> SupervisorResult<()>;
}

/// Used when updates are disabled for an instance.
pub struct NoopUpdater;

#[async_trait]
impl Updater for NoopUpdater {
    async fn is_new_version_available(&self) -> SupervisorResult<bool> {
        Ok(false)
    }

    async fn update(&self) -> SupervisorResult<()> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LatestVersion {
    #[serde(rename = "Latest")]
    latest: String,
}

/// Compares the installed mod version with the published one and runs the
/// bundled updater.
pub struct ModUpdater {
    server_path: PathBuf,
    version_url: String,
    client: reqwest::Client,
}

impl ModUpdater {
    pub fn new(
        server_path: impl Into<PathBuf>,
        version_url: impl Into<String>,
        timeout: Duration,
    ) -> SupervisorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SupervisorError::internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            server_path: server_path.into(),
            version_url: version_url.into(),
            client,
        })
    }

    /// Version from the `<version>` element of `mods/pr/mod.desc`.
    pub fn current_version(&self) -> SupervisorResult<String> {
        let path = self.server_path.join(MOD_DESC_PATH);
        let content =
            std::fs::read_to_string(&path).map_err(|e| SupervisorError::io(&path, e))?;

        extract_version(&content).ok_or_else(|| {
            SupervisorError::update_failed(format!("no <version> in {}", path.display()))
        })
    }

    pub async fn latest_version(&self) -> SupervisorResult<String> {
        let response = self
            .client
            .get(&self.version_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SupervisorError::update_failed(format!("{}: {e}", self.version_url)))?;

        let body: LatestVersion = response.json().await.map_err(|e| {
            SupervisorError::update_failed(format!("invalid version document: {e}"))
        })?;

        Ok(body.latest.trim().to_string())
    }

    fn updater_dir(&self) -> PathBuf {
        self.server_path.join(UPDATER_DIR)
    }
}

#[async_trait]
impl Updater for ModUpdater {
    async fn is_new_version_available(&self) -> SupervisorResult<bool> {
        let current = self.current_version()?;
        let latest = self.latest_version().await?;
        let available = compare_versions(&latest, &current) == Ordering::Greater;

        if available {
            info!(%current, %latest, "New server version available");
        }
        Ok(available)
    }

    async fn update(&self) -> SupervisorResult<()> {
        let dir = self.updater_dir();
        let exe = dir.join(UPDATER_EXE);
        os::ensure_executable(&exe).map_err(|e| SupervisorError::io(&exe, e))?;

        info!(updater = %exe.display(), "Running server updater");
        let output = Command::new(&exe)
            .current_dir(&dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SupervisorError::update_failed(format!("cannot run updater: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SupervisorError::update_failed(format!(
                "updater exited with {}: {}",
                output.status,
                tail(stderr.trim(), OUTPUT_TAIL_BYTES)
            )));
        }

        info!(version = ?self.current_version().ok(), "Server updated");
        Ok(())
    }
}

/// Text of the first `<version>` element.
pub fn extract_version(mod_desc: &str) -> Option<String> {
    let start = mod_desc.find("<version>")? + "<version>".len();
    let end = start + mod_desc[start..].find("</version>")?;
    let version = mod_desc[start..end].trim();
    (!version.is_empty()).then(|| version.to_string())
}

/// Compare dotted numeric versions. Missing parts count as zero and
/// non-numeric parts compare as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(a), parse(b));

    (0..a.len().max(b.len()))
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

