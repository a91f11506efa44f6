mod client_config;
mod config;
mod daemon_config;
mod daemon_file;
mod error;
mod log_level;
mod logging_config;
mod supervisor_config;
mod update_check_policy;

#[cfg(test)]
mod tests;

pub use client_config::ClientConfig;
pub use config::Config;
pub use daemon_config::DaemonConfig;
pub use daemon_file::{daemon_file_info::DaemonFileInfo, is_process_running};
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use supervisor_config::SupervisorConfig;
pub use update_check_policy::UpdateCheckPolicy;

pub const CONFIG_DIR_ENV: &str = "SVCTL_CONFIG_DIR";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const STATE_FILENAME: &str = "state.json";

const APP_DIR_NAME: &str = "svctl";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 50051;
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_ANSI: bool = true;
