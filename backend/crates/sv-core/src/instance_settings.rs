use crate::store::{INSTANCE_DIR, write_empty_cache};
use crate::{SupervisorError, SupervisorResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

const SETTINGS_FILENAME: &str = "config.toml";

pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPDATE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_VERSION_URL: &str = "http://prbf2.cdn.ancientdev.com/version.json";

/// Per-instance settings from `<instance>/.svctl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceSettings {
    pub render: RenderSettings,
    pub update: UpdateSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Program and arguments, run inside the instance directory
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
        }
    }
}

impl RenderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    pub enabled: bool,
    /// JSON document of the form `{"Latest": "x.y.z"}`
    pub version_url: String,
    /// Bound on the version lookup request
    pub timeout_secs: u64,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            version_url: DEFAULT_VERSION_URL.to_string(),
            timeout_secs: DEFAULT_UPDATE_TIMEOUT_SECS,
        }
    }
}

impl UpdateSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl InstanceSettings {
    /// Load settings for `instance`. A missing file means defaults.
    pub fn load(instance: &Path) -> SupervisorResult<Self> {
        let path = instance.join(INSTANCE_DIR).join(SETTINGS_FILENAME);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(SupervisorError::io(&path, e)),
        };

        toml::from_str(&content).map_err(|e| {
            SupervisorError::invalid_path(instance, format!("invalid {}: {e}", path.display()))
        })
    }

    /// Turn `instance` into an initialized server installation.
    ///
    /// Creates `.svctl/` with default settings and an empty PID cache.
    /// Refuses to touch an installation that already has `.svctl/`.
    /// Returns the canonical instance path.
    pub fn initialize(instance: &Path) -> SupervisorResult<PathBuf> {
        let instance = instance
            .canonicalize()
            .map_err(|e| SupervisorError::invalid_path(instance, e.to_string()))?;
        if !instance.is_dir() {
            return Err(SupervisorError::invalid_path(instance, "not a directory"));
        }

        let dir = instance.join(INSTANCE_DIR);
        match std::fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(SupervisorError::already_initialized(instance));
            }
            Err(e) => return Err(SupervisorError::io(&dir, e)),
        }

        let settings_path = dir.join(SETTINGS_FILENAME);
        let content = toml::to_string_pretty(&Self::default()).map_err(|e| {
            SupervisorError::persistence(&settings_path, format!("serialize failed: {e}"))
        })?;
        std::fs::write(&settings_path, content)
            .map_err(|e| SupervisorError::io(&settings_path, e))?;

        write_empty_cache(&instance)?;

        info!(path = %instance.display(), "Server initialized");
        Ok(instance)
    }
}
