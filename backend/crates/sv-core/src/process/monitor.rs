use crate::process::os;
use crate::{ProcessHealth, ProcessTable};

use std::process::ExitStatus;
use std::time::Duration;

use tokio::sync::watch;

const ADOPTED_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Exit notification for one process.
///
/// Spawned children publish their status from the reaper task. Adopted
/// processes are not our children, so they have no signal and are polled.
#[derive(Debug, Clone)]
pub struct ExitSignal {
    rx: Option<watch::Receiver<Option<ExitStatus>>>,
}

impl ExitSignal {
    pub(crate) fn spawned(rx: watch::Receiver<Option<ExitStatus>>) -> Self {
        Self { rx: Some(rx) }
    }

    pub(crate) fn adopted() -> Self {
        Self { rx: None }
    }

    /// Resolves when the reaper has collected the child. Never resolves for
    /// adopted processes.
    pub async fn exited(&mut self) -> Option<ExitStatus> {
        match &mut self.rx {
            Some(rx) => match rx.wait_for(Option::is_some).await {
                Ok(status) => *status,
                // Reaper gone without publishing: the child handle was dropped
                Err(_) => None,
            },
            None => std::future::pending().await,
        }
    }

    pub fn has_exited(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| rx.borrow().is_some())
    }

    pub fn is_adopted(&self) -> bool {
        self.rx.is_none()
    }
}

/// Read-only view of an owned process, safe to hand to watcher tasks.
#[derive(Clone)]
pub struct ProcessMonitor {
    pid: u32,
    exit: ExitSignal,
    table: ProcessTable,
}

impl ProcessMonitor {
    pub(crate) fn new(pid: u32, exit: ExitSignal, table: ProcessTable) -> Self {
        Self { pid, exit, table }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    pub async fn health(&self) -> ProcessHealth {
        if self.exit.has_exited() {
            return ProcessHealth::Exited;
        }
        self.table.probe(self.pid).await
    }

    /// Wait until the process is gone.
    pub async fn wait(&self) -> Option<ExitStatus> {
        if self.exit.is_adopted() {
            while os::is_alive(self.pid) {
                tokio::time::sleep(ADOPTED_POLL_INTERVAL).await;
            }
            return None;
        }

        self.exit.clone().exited().await
    }
}
