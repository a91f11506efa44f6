use crate::{
    APP_DIR_NAME, CONFIG_DIR_ENV, CONFIG_FILENAME, ClientConfig, ConfigError, ConfigErrorResult,
    DaemonConfig, LoggingConfig, STATE_FILENAME, SupervisorConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub supervisor: SupervisorConfig,
    pub logging: LoggingConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Load config for the daemon or the CLI.
    ///
    /// Loading order:
    /// 1. `SVCTL_CONFIG_DIR` env var, else `<user cache dir>/svctl`
    /// 2. Auto-create the config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply SVCTL_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load from an explicit directory instead of the resolved one.
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.to_path_buf(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: SVCTL_CONFIG_DIR env var > `<user cache dir>/svctl`
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        dirs::cache_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoCacheDir)
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.daemon.validate()?;
        self.supervisor.validate()?;
        self.client.validate()?;

        let log_dir = Path::new(&self.logging.dir);
        if log_dir.is_absolute() || self.logging.dir.contains("..") {
            return Err(ConfigError::config(
                "logging.dir must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// File holding the set of registered server paths.
    pub fn state_path() -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(STATE_FILENAME))
    }

    /// Directory for rolling daemon logs.
    pub fn log_dir(&self) -> ConfigErrorResult<PathBuf> {
        Ok(Self::config_dir()?.join(&self.logging.dir))
    }

    /// Get bind address as string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.daemon.host, self.daemon.port)
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  daemon: {}:{}", self.daemon.host, self.daemon.port);
        info!(
            "  supervisor: max_restarts={} per {}s, stop_grace={}ms, kill_timeout={}s",
            self.supervisor.max_restarts,
            self.supervisor.restart_window_secs,
            self.supervisor.stop_grace_ms,
            self.supervisor.kill_timeout_secs
        );
        info!(
            "  watchers: health every {}ms, render every {}s, update check {}",
            self.supervisor.health_interval_ms,
            self.supervisor.render_interval_secs,
            self.supervisor.update_check
        );
        info!(
            "  logging: {} (dir: {}, ansi: {})",
            self.logging.level, self.logging.dir, self.logging.ansi
        );
        info!("  client: timeout={}s", self.client.timeout_secs);
    }

    fn apply_env_overrides(&mut self) {
        // Daemon
        Self::apply_env_string("SVCTL_DAEMON_HOST", &mut self.daemon.host);
        Self::apply_env_parse("SVCTL_DAEMON_PORT", &mut self.daemon.port);

        // Supervisor
        Self::apply_env_parse(
            "SVCTL_SUPERVISOR_MAX_RESTARTS",
            &mut self.supervisor.max_restarts,
        );
        Self::apply_env_parse(
            "SVCTL_SUPERVISOR_RESTART_WINDOW_SECS",
            &mut self.supervisor.restart_window_secs,
        );
        Self::apply_env_parse(
            "SVCTL_SUPERVISOR_STOP_GRACE_MS",
            &mut self.supervisor.stop_grace_ms,
        );
        Self::apply_env_parse(
            "SVCTL_SUPERVISOR_KILL_TIMEOUT_SECS",
            &mut self.supervisor.kill_timeout_secs,
        );
        Self::apply_env_parse(
            "SVCTL_SUPERVISOR_HEALTH_INTERVAL_MS",
            &mut self.supervisor.health_interval_ms,
        );
        Self::apply_env_parse(
            "SVCTL_SUPERVISOR_RENDER_INTERVAL_SECS",
            &mut self.supervisor.render_interval_secs,
        );
        Self::apply_env_parse(
            "SVCTL_SUPERVISOR_UPDATE_CHECK",
            &mut self.supervisor.update_check,
        );

        // Logging
        Self::apply_env_parse("SVCTL_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_string("SVCTL_LOG_DIR", &mut self.logging.dir);
        Self::apply_env_bool("SVCTL_LOG_ANSI", &mut self.logging.ansi);

        // Client
        Self::apply_env_parse("SVCTL_CLIENT_TIMEOUT_SECS", &mut self.client.timeout_secs);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values.
    /// Unparseable values are ignored so the file/default value stays in effect.
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }
}
