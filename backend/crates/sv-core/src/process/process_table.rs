use crate::ProcessHealth;
use crate::process::os;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(windows)]
use crate::process::tasklist::{self, TaskEntry};
#[cfg(windows)]
use std::collections::HashMap;
#[cfg(windows)]
use tokio::time::{Duration, Instant};

#[cfg(windows)]
const SNAPSHOT_TTL: Duration = Duration::from_secs(1);

/// PIDs owned by some instance in this daemon.
///
/// Shared by every controller so that two instances never own one process.
/// On Windows it also caches one `tasklist` snapshot per second for all
/// health probes.
#[derive(Clone, Default)]
pub struct ProcessTable {
    claimed: Arc<Mutex<HashSet<u32>>>,
    #[cfg(windows)]
    snapshot: Arc<tokio::sync::Mutex<Option<(Instant, HashMap<u32, TaskEntry>)>>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `pid`. Returns false if another owner already holds it.
    pub fn claim(&self, pid: u32) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pid)
    }

    pub fn release(&self, pid: u32) {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pid);
    }

    pub fn is_claimed(&self, pid: u32) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Platform liveness probe for a process that is not our child.
    #[cfg(not(windows))]
    pub async fn probe(&self, pid: u32) -> ProcessHealth {
        if os::is_alive(pid) {
            ProcessHealth::Healthy
        } else {
            ProcessHealth::Exited
        }
    }

    /// Platform liveness probe. Also detects servers stuck on error dialogs.
    #[cfg(windows)]
    pub async fn probe(&self, pid: u32) -> ProcessHealth {
        if !os::is_alive(pid) {
            return ProcessHealth::Exited;
        }

        let mut cached = self.snapshot.lock().await;
        let stale = cached
            .as_ref()
            .is_none_or(|(taken_at, _)| taken_at.elapsed() >= SNAPSHOT_TTL);

        if stale {
            match tasklist::snapshot().await {
                Ok(entries) => *cached = Some((Instant::now(), entries)),
                Err(e) => {
                    // A failed listing says nothing about the server itself
                    tracing::debug!("tasklist failed: {e}");
                    return ProcessHealth::Healthy;
                }
            }
        }

        cached
            .as_ref()
            .and_then(|(_, entries)| entries.get(&pid))
            .map(TaskEntry::health)
            .unwrap_or(ProcessHealth::Healthy)
    }
}
