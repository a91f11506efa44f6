use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

pub const MIN_CLIENT_TIMEOUT_SECS: u64 = 1;
pub const MAX_CLIENT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 5;

/// Settings for `svctl` talking to the daemon.
///
/// The timeout only bounds how long the CLI waits. The daemon keeps working
/// on an action after the CLI gives up.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_CLIENT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.timeout_secs < MIN_CLIENT_TIMEOUT_SECS
            || self.timeout_secs > MAX_CLIENT_TIMEOUT_SECS
        {
            return Err(ConfigError::client(format!(
                "client.timeout_secs must be {}-{}, got {}",
                MIN_CLIENT_TIMEOUT_SECS, MAX_CLIENT_TIMEOUT_SECS, self.timeout_secs
            )));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
