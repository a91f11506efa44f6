use crate::{SupervisorError, SupervisorResult};

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Keep error messages readable when a script dumps a lot on stderr.
const STDERR_TAIL_BYTES: usize = 512;

/// Regenerates the server's on-disk configuration.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self) -> SupervisorResult<()>;
}

/// Used when an instance has no render command configured.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn render(&self) -> SupervisorResult<()> {
        Ok(())
    }
}

/// Runs an external command in the instance directory.
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    timeout: Duration,
}

impl CommandRenderer {
    pub fn new(
        command: &[String],
        cwd: impl Into<PathBuf>,
        timeout: Duration,
    ) -> SupervisorResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| SupervisorError::render_failed("render command is empty"))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: cwd.into(),
            timeout,
        })
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self) -> SupervisorResult<()> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SupervisorError::render_failed(format!("cannot run '{}': {e}", self.program))
            })?;

        // Timing out drops the child, which kills it
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                SupervisorError::render_failed(format!(
                    "'{}' timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| SupervisorError::render_failed(format!("'{}': {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SupervisorError::render_failed(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                tail(stderr.trim(), STDERR_TAIL_BYTES)
            )));
        }

        debug!(program = %self.program, cwd = %self.cwd.display(), "Rendered configuration");
        Ok(())
    }
}

pub(crate) fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
