use crate::process::os;
use crate::{
    ExitSignal, LaunchSpec, ProcessHealth, ProcessMonitor, ProcessTable, SupervisorError,
    SupervisorResult,
};

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long to wait for the kernel to confirm a SIGKILL.
const KILL_CONFIRM_TIMEOUT: Duration = Duration::from_secs(2);

struct ProcessHandle {
    pid: u32,
    exit: ExitSignal,
    /// Only spawned children have a reaper
    reaper: Option<JoinHandle<()>>,
}

/// Owns at most one server process for one instance.
///
/// The only component that touches OS process primitives. Every PID it
/// owns is claimed in the shared [`ProcessTable`] and released again on
/// every path out, including errors.
pub struct ProcessController {
    spec: LaunchSpec,
    table: ProcessTable,
    kill_timeout: Duration,
    handle: Option<ProcessHandle>,
    /// Makes termination fail while leaving the process alive
    #[cfg(test)]
    refuse_termination: bool,
}

impl ProcessController {
    pub fn new(spec: LaunchSpec, table: ProcessTable, kill_timeout: Duration) -> Self {
        Self {
            spec,
            table,
            kill_timeout,
            handle: None,
            #[cfg(test)]
            refuse_termination: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn refuse_termination(&mut self) {
        self.refuse_termination = true;
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.as_ref().map(|handle| handle.pid)
    }

    pub fn is_owned(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the server. A reaper task publishes the exit status.
    pub fn start(&mut self) -> SupervisorResult<u32> {
        if let Some(handle) = &self.handle {
            return Err(SupervisorError::already_running(handle.pid));
        }

        let program = &self.spec.program;
        if self.spec.ensure_executable {
            os::ensure_executable(program)
                .map_err(|e| SupervisorError::spawn_failed(program, e))?;
        }

        let mut command = Command::new(program);
        command
            .args(&self.spec.args)
            .current_dir(&self.spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        for (key, value) in &self.spec.env {
            command.env(key, value);
        }

        // Own process group: a Ctrl-C aimed at the daemon must not reach the server
        #[cfg(unix)]
        command.process_group(0);

        #[cfg(windows)]
        if self.spec.high_priority {
            command.creation_flags(windows_sys::Win32::System::Threading::HIGH_PRIORITY_CLASS);
        }

        let mut child = command
            .spawn()
            .map_err(|e| SupervisorError::spawn_failed(program, e))?;

        let pid = child
            .id()
            .ok_or_else(|| SupervisorError::internal("spawned child has no PID"))?;

        if !self.table.claim(pid) {
            warn!(pid, "Fresh PID was still claimed, taking it over");
        }

        let (tx, rx) = watch::channel(None);
        let reaper = tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    debug!(pid, %status, "Server process reaped");
                    let _ = tx.send(Some(status));
                }
                Err(e) => warn!(pid, "Failed to wait for server process: {e}"),
            }
        });

        self.handle = Some(ProcessHandle {
            pid,
            exit: ExitSignal::spawned(rx),
            reaper: Some(reaper),
        });

        info!(pid, program = %program.display(), "Spawned server process");
        Ok(pid)
    }

    /// Take ownership of a process started by an earlier daemon run.
    pub fn adopt(&mut self, pid: u32) -> SupervisorResult<()> {
        if let Some(handle) = &self.handle {
            return Err(SupervisorError::already_running(handle.pid));
        }

        if !os::is_alive(pid) {
            return Err(SupervisorError::adoption_rejected(
                pid,
                "process is not running",
            ));
        }

        if !os::image_matches(pid, &self.spec.expected_exe) {
            return Err(SupervisorError::adoption_rejected(
                pid,
                format!(
                    "process is not {}",
                    self.spec.expected_exe.display()
                ),
            ));
        }

        if !self.table.claim(pid) {
            return Err(SupervisorError::adoption_rejected(
                pid,
                "process is owned by another instance",
            ));
        }

        self.handle = Some(ProcessHandle {
            pid,
            exit: ExitSignal::adopted(),
            reaper: None,
        });

        info!(pid, "Adopted server process");
        Ok(())
    }

    /// Send the graceful signal only. Used before the stop grace period.
    pub fn signal_terminate(&self) -> SupervisorResult<()> {
        let Some(handle) = &self.handle else {
            return Err(SupervisorError::not_running());
        };

        if has_exited(handle.pid, &handle.exit) {
            return Ok(());
        }

        os::send_terminate(handle.pid).map_err(|e| {
            SupervisorError::internal(format!("failed to signal PID {}: {e}", handle.pid))
        })
    }

    /// Terminate and release the owned process.
    ///
    /// Succeeds when nothing is owned or the process is already gone. The
    /// handle and its table claim are released even when termination fails.
    pub async fn stop(&mut self) -> SupervisorResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        let result = self.terminate(handle.pid, &handle.exit).await;
        self.table.release(handle.pid);

        if let Some(reaper) = handle.reaper {
            if result.is_ok() {
                let _ = reaper.await;
            } else {
                reaper.abort();
            }
        }

        if result.is_ok() {
            info!(pid = handle.pid, "Server process stopped");
        }
        result
    }

    /// Let go of the owned process without terminating it.
    ///
    /// Used on daemon shutdown so the next run can adopt the server again.
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.table.release(handle.pid);
            if let Some(reaper) = handle.reaper {
                reaper.abort();
            }
            debug!(pid = handle.pid, "Released server process");
        }
    }

    /// Terminate a leftover process we do not own, e.g. a persisted PID.
    ///
    /// Does nothing unless the PID is alive, unclaimed and runs the expected
    /// server image. Returns whether a process was terminated.
    pub async fn terminate_stray(&self, pid: u32) -> SupervisorResult<bool> {
        if self.handle.is_some()
            || self.table.is_claimed(pid)
            || !os::is_alive(pid)
            || !os::image_matches(pid, &self.spec.expected_exe)
        {
            return Ok(false);
        }

        info!(pid, "Terminating leftover server process");
        self.terminate(pid, &ExitSignal::adopted()).await?;
        Ok(true)
    }

    pub async fn health_check(&self) -> SupervisorResult<ProcessHealth> {
        Ok(self.monitor()?.health().await)
    }

    /// Resolves when the owned process exits.
    pub async fn wait(&self) -> SupervisorResult<Option<ExitStatus>> {
        Ok(self.monitor()?.wait().await)
    }

    pub fn monitor(&self) -> SupervisorResult<ProcessMonitor> {
        let handle = self.handle.as_ref().ok_or_else(SupervisorError::not_running)?;
        Ok(ProcessMonitor::new(
            handle.pid,
            handle.exit.clone(),
            self.table.clone(),
        ))
    }

    async fn terminate(&self, pid: u32, exit: &ExitSignal) -> SupervisorResult<()> {
        if has_exited(pid, exit) {
            return Ok(());
        }

        #[cfg(test)]
        if self.refuse_termination {
            return Err(SupervisorError::internal(format!("PID {pid} survived SIGKILL")));
        }

        os::send_terminate(pid).map_err(|e| {
            SupervisorError::internal(format!("failed to signal PID {pid}: {e}"))
        })?;

        let monitor = ProcessMonitor::new(pid, exit.clone(), self.table.clone());
        if tokio::time::timeout(self.kill_timeout, monitor.wait())
            .await
            .is_ok()
        {
            return Ok(());
        }

        warn!(
            pid,
            "Server did not exit within {:?}, killing it", self.kill_timeout
        );
        os::send_kill(pid)
            .map_err(|e| SupervisorError::internal(format!("failed to kill PID {pid}: {e}")))?;

        tokio::time::timeout(KILL_CONFIRM_TIMEOUT, monitor.wait())
            .await
            .map(|_| ())
            .map_err(|_| SupervisorError::internal(format!("PID {pid} survived SIGKILL")))
    }
}

impl Drop for ProcessController {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.table.release(handle.pid);
        }
    }
}

fn has_exited(pid: u32, exit: &ExitSignal) -> bool {
    if exit.is_adopted() {
        !os::is_alive(pid)
    } else {
        exit.has_exited()
    }
}
