//! Logging setup with file rotation.

use crate::error::{DaemonError, Result as DaemonResult};

use sv_config::LoggingConfig;

use std::path::Path;

use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "svctl-daemon";
const MAX_LOG_FILES: usize = 7;

/// Install console and rotating file output.
///
/// `RUST_LOG` wins over the configured level. Records emitted through the
/// `log` facade (sv-config) are forwarded as well.
///
/// # Log Layers
/// - Console: human readable, colored when `logging.ansi` is set
/// - File: plain text, daily rotation, 7 files kept
pub fn initialize(logging: &LoggingConfig, log_dir: &Path) -> DaemonResult<()> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        DaemonError::logging(format!("cannot create {}: {e}", log_dir.display()))
    })?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(logging.ansi);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| DaemonError::logging(format!("cannot open log file: {e}")))?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DaemonError::logging(e.to_string()))?;

    info!(
        level = %logging.level,
        dir = %log_dir.display(),
        "Logger initialized"
    );
    Ok(())
}
