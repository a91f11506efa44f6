//! Discovery file for the running daemon.
//!
//! The daemon writes `<config_dir>/daemon.json` after binding its listener.
//! `svctl` reads it to find the daemon without a `--server` flag.
//!
//! ## Stale file detection
//!
//! A daemon that crashes leaves the file behind. `read_live_in()` checks the
//! recorded PID and removes the file when that process is gone.
//!
//! ## Single daemon per config directory
//!
//! `write_in()` refuses to replace the file of a daemon that is still alive.

use crate::{Config, ConfigError, ConfigErrorResult, is_process_running};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DAEMON_FILENAME: &str = "daemon.json";

/// Information stored in the daemon discovery file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonFileInfo {
    /// Process ID of the daemon that wrote this file
    pub pid: u32,
    /// Port the control surface listens on
    pub port: u16,
    /// Host the control surface is bound to
    pub host: String,
    /// RFC 3339 timestamp of daemon start
    pub started_at: String,
    /// Daemon version, handy when comparing against the CLI version
    pub version: String,
}

impl DaemonFileInfo {
    /// Base URL for the control surface.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Write the discovery file into the resolved config directory.
    pub fn write(port: u16, host: &str) -> ConfigErrorResult<PathBuf> {
        Self::write_in(&Config::config_dir()?, port, host)
    }

    /// Write the discovery file into `config_dir`.
    ///
    /// Creates the directory when missing and drops a stale file first.
    /// Note: there is a small window between the liveness check and the
    /// write. Two daemons racing on one config directory is not supported.
    pub fn write_in(config_dir: &Path, port: u16, host: &str) -> ConfigErrorResult<PathBuf> {
        let path = config_dir.join(DAEMON_FILENAME);

        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        if let Some(existing) = Self::read_live_in(config_dir)?
            && existing.pid != std::process::id()
        {
            return Err(ConfigError::daemon(format!(
                "Another svctl daemon is already running on port {} (PID {}). \
                   Stop it first or use a different {}.",
                existing.port,
                existing.pid,
                crate::CONFIG_DIR_ENV
            )));
        }

        let info = DaemonFileInfo {
            pid: std::process::id(),
            port,
            host: host.to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let content = serde_json::to_string_pretty(&info)
            .map_err(|e| ConfigError::serde(format!("Failed to serialize daemon file: {e}")))?;

        std::fs::write(&path, content).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Read the discovery file from `config_dir`.
    ///
    /// Returns `Ok(None)` if the file does not exist and `Err` if it cannot
    /// be read or parsed.
    pub fn read_in(config_dir: &Path) -> ConfigErrorResult<Option<DaemonFileInfo>> {
        let path = config_dir.join(DAEMON_FILENAME);

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        let info = serde_json::from_str(&content).map_err(|e| {
            ConfigError::serde(format!("Invalid daemon file {}: {e}", path.display()))
        })?;

        Ok(Some(info))
    }

    /// Read the discovery file from the resolved config directory and verify
    /// the daemon is still alive. This is what the CLI uses.
    pub fn read_live() -> ConfigErrorResult<Option<DaemonFileInfo>> {
        Self::read_live_in(&Config::config_dir()?)
    }

    /// Read from `config_dir`, removing the file if its daemon is gone.
    pub fn read_live_in(config_dir: &Path) -> ConfigErrorResult<Option<DaemonFileInfo>> {
        let Some(info) = Self::read_in(config_dir)? else {
            return Ok(None);
        };

        if is_process_running(info.pid) {
            return Ok(Some(info));
        }

        log::debug!(
            "Removing stale daemon file (pid {} no longer running)",
            info.pid
        );
        Self::remove_in(config_dir)?;
        Ok(None)
    }

    /// Delete the discovery file. Called by the daemon on graceful shutdown.
    pub fn remove() -> ConfigErrorResult<()> {
        Self::remove_in(&Config::config_dir()?)
    }

    /// Delete the discovery file in `config_dir`; a missing file is fine.
    pub fn remove_in(config_dir: &Path) -> ConfigErrorResult<()> {
        let path = config_dir.join(DAEMON_FILENAME);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::Io { path, source: e }),
        }
    }

    /// Path of the discovery file, for error messages.
    pub fn path() -> ConfigErrorResult<PathBuf> {
        Ok(Config::config_dir()?.join(DAEMON_FILENAME))
    }
}
