use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// When a restarting instance asks its updater for a newer server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateCheckPolicy {
    /// Before every respawn, planned or not
    #[default]
    EveryRestart,
    /// Only for the first unplanned exit of a crash streak (and planned restarts)
    FirstInStreak,
    /// Never consult the updater
    Never,
}

impl fmt::Display for UpdateCheckPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateCheckPolicy::EveryRestart => "every_restart",
            UpdateCheckPolicy::FirstInStreak => "first_in_streak",
            UpdateCheckPolicy::Never => "never",
        };
        f.write_str(name)
    }
}

impl FromStr for UpdateCheckPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "every_restart" => Ok(UpdateCheckPolicy::EveryRestart),
            "first_in_streak" => Ok(UpdateCheckPolicy::FirstInStreak),
            "never" => Ok(UpdateCheckPolicy::Never),
            other => Err(format!("unknown update check policy '{other}'")),
        }
    }
}
