use crate::{ConfigError, ConfigErrorResult, UpdateCheckPolicy};

use std::time::Duration;

use serde::Deserialize;

// Restart budget
pub const MIN_MAX_RESTARTS: u32 = 1;
pub const MAX_MAX_RESTARTS: u32 = 100;
pub const DEFAULT_MAX_RESTARTS: u32 = 5;

pub const MIN_RESTART_WINDOW_SECS: u64 = 1;
pub const MAX_RESTART_WINDOW_SECS: u64 = 3600;
pub const DEFAULT_RESTART_WINDOW_SECS: u64 = 60;

// Stop sequence
pub const MAX_STOP_GRACE_MS: u64 = 10_000;
pub const DEFAULT_STOP_GRACE_MS: u64 = 300;

pub const MIN_KILL_TIMEOUT_SECS: u64 = 1;
pub const MAX_KILL_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_KILL_TIMEOUT_SECS: u64 = 10;

// Watchers
pub const MIN_HEALTH_INTERVAL_MS: u64 = 50;
pub const MAX_HEALTH_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_HEALTH_INTERVAL_MS: u64 = 500;

pub const MIN_RENDER_INTERVAL_SECS: u64 = 1;
pub const MAX_RENDER_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_RENDER_INTERVAL_SECS: u64 = 60;

/// Timing and budget knobs shared by every instance supervisor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Unplanned restarts allowed inside one window before giving up
    pub max_restarts: u32,
    /// Quiet period after which the restart counter resets
    pub restart_window_secs: u64,
    /// Pause between the graceful signal and cancelling watchers on Stop
    pub stop_grace_ms: u64,
    /// How long a process gets to exit after SIGTERM before SIGKILL
    pub kill_timeout_secs: u64,
    /// Liveness probe interval while running
    pub health_interval_ms: u64,
    /// Configuration re-render interval while running
    pub render_interval_secs: u64,
    pub update_check: UpdateCheckPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_restarts: DEFAULT_MAX_RESTARTS,
            restart_window_secs: DEFAULT_RESTART_WINDOW_SECS,
            stop_grace_ms: DEFAULT_STOP_GRACE_MS,
            kill_timeout_secs: DEFAULT_KILL_TIMEOUT_SECS,
            health_interval_ms: DEFAULT_HEALTH_INTERVAL_MS,
            render_interval_secs: DEFAULT_RENDER_INTERVAL_SECS,
            update_check: UpdateCheckPolicy::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.max_restarts < MIN_MAX_RESTARTS || self.max_restarts > MAX_MAX_RESTARTS {
            return Err(ConfigError::supervisor(format!(
                "supervisor.max_restarts must be {}-{}, got {}",
                MIN_MAX_RESTARTS, MAX_MAX_RESTARTS, self.max_restarts
            )));
        }

        if self.restart_window_secs < MIN_RESTART_WINDOW_SECS
            || self.restart_window_secs > MAX_RESTART_WINDOW_SECS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.restart_window_secs must be {}-{}, got {}",
                MIN_RESTART_WINDOW_SECS, MAX_RESTART_WINDOW_SECS, self.restart_window_secs
            )));
        }

        if self.stop_grace_ms > MAX_STOP_GRACE_MS {
            return Err(ConfigError::supervisor(format!(
                "supervisor.stop_grace_ms must be at most {}, got {}",
                MAX_STOP_GRACE_MS, self.stop_grace_ms
            )));
        }

        if self.kill_timeout_secs < MIN_KILL_TIMEOUT_SECS
            || self.kill_timeout_secs > MAX_KILL_TIMEOUT_SECS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.kill_timeout_secs must be {}-{}, got {}",
                MIN_KILL_TIMEOUT_SECS, MAX_KILL_TIMEOUT_SECS, self.kill_timeout_secs
            )));
        }

        if self.health_interval_ms < MIN_HEALTH_INTERVAL_MS
            || self.health_interval_ms > MAX_HEALTH_INTERVAL_MS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.health_interval_ms must be {}-{}, got {}",
                MIN_HEALTH_INTERVAL_MS, MAX_HEALTH_INTERVAL_MS, self.health_interval_ms
            )));
        }

        if self.render_interval_secs < MIN_RENDER_INTERVAL_SECS
            || self.render_interval_secs > MAX_RENDER_INTERVAL_SECS
        {
            return Err(ConfigError::supervisor(format!(
                "supervisor.render_interval_secs must be {}-{}, got {}",
                MIN_RENDER_INTERVAL_SECS, MAX_RENDER_INTERVAL_SECS, self.render_interval_secs
            )));
        }

        Ok(())
    }

    pub fn restart_window(&self) -> Duration {
        Duration::from_secs(self.restart_window_secs)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_secs(self.kill_timeout_secs)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_secs(self.render_interval_secs)
    }
}
