mod property_tests;
mod store;


use crate::{
    InstanceFactory, InstanceParts, InstanceStatus, LaunchSpec, PersistenceStore, Renderer,
    SupervisorError, SupervisorResult, Updater,
};

use sv_config::{SupervisorConfig, UpdateCheckPolicy};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::watch;

// =========================================================================
// Fakes
// =========================================================================

#[derive(Default)]
pub(crate) struct FakeRenderer {
    calls: AtomicU32,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl FakeRenderer {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every render take `delay`.
    pub(crate) fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self) -> SupervisorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SupervisorError::render_failed("template broken"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeUpdater {
    available: AtomicBool,
    check_fails: AtomicBool,
    update_fails: AtomicBool,
    checks: AtomicU32,
    updates: AtomicU32,
}

impl FakeUpdater {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub(crate) fn set_check_fails(&self, fails: bool) {
        self.check_fails.store(fails, Ordering::SeqCst);
    }

    pub(crate) fn set_update_fails(&self, fails: bool) {
        self.update_fails.store(fails, Ordering::SeqCst);
    }

    pub(crate) fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }

    pub(crate) fn updates(&self) -> u32 {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Updater for FakeUpdater {
    async fn is_new_version_available(&self) -> SupervisorResult<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.check_fails.load(Ordering::SeqCst) {
            return Err(SupervisorError::update_failed("version server unreachable"));
        }
        Ok(self.available.load(Ordering::SeqCst))
    }

    async fn update(&self) -> SupervisorResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.update_fails.load(Ordering::SeqCst) {
            return Err(SupervisorError::update_failed("patch rejected"));
        }
        self.available.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pids: Mutex<HashMap<PathBuf, u32>>,
    paths: Mutex<Vec<PathBuf>>,
}

impl MemoryStore {
    pub(crate) fn pid_of(&self, instance: &Path) -> Option<u32> {
        self.pids.lock().unwrap().get(instance).copied()
    }
}

impl PersistenceStore for MemoryStore {
    fn store_pid(&self, instance: &Path, pid: Option<u32>) -> SupervisorResult<()> {
        let mut pids = self.pids.lock().unwrap();
        match pid {
            Some(pid) => pids.insert(instance.to_path_buf(), pid),
            None => pids.remove(instance),
        };
        Ok(())
    }

    fn read_pid(&self, instance: &Path) -> SupervisorResult<Option<u32>> {
        Ok(self.pid_of(instance))
    }

    fn registered_paths(&self) -> SupervisorResult<Vec<PathBuf>> {
        Ok(self.paths.lock().unwrap().clone())
    }

    fn append_registered_path(&self, instance: &Path) -> SupervisorResult<()> {
        let mut paths = self.paths.lock().unwrap();
        if !paths.iter().any(|p| p == instance) {
            paths.push(instance.to_path_buf());
        }
        Ok(())
    }
}

/// Launches `program args..` in the instance directory with fake collaborators.
pub(crate) struct TestFactory {
    pub(crate) renderer: Arc<FakeRenderer>,
    pub(crate) updater: Arc<FakeUpdater>,
    program: PathBuf,
    args: Vec<String>,
}

impl TestFactory {
    pub(crate) fn sleeper() -> Self {
        Self::new(sleep_binary(), &["30"])
    }

    pub(crate) fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            renderer: FakeRenderer::new(),
            updater: FakeUpdater::new(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl InstanceFactory for TestFactory {
    fn build(&self, path: &Path) -> SupervisorResult<InstanceParts> {
        let mut launch = LaunchSpec::new(&self.program, path);
        for arg in &self.args {
            launch = launch.arg(arg);
        }

        Ok(InstanceParts {
            launch,
            renderer: self.renderer.clone(),
            updater: self.updater.clone(),
        })
    }
}

// =========================================================================
// Helpers
// =========================================================================

/// Short timings so lifecycle tests finish quickly.
pub(crate) fn fast_config() -> SupervisorConfig {
    SupervisorConfig {
        max_restarts: 3,
        restart_window_secs: 60,
        stop_grace_ms: 50,
        kill_timeout_secs: 2,
        health_interval_ms: 50,
        render_interval_secs: 3600,
        update_check: UpdateCheckPolicy::EveryRestart,
    }
}

/// Temp directory laid out as an initialized server installation.
pub(crate) fn instance_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join(crate::INSTANCE_DIR)).unwrap();
    temp
}

pub(crate) fn sleep_binary() -> PathBuf {
    ["/bin/sleep", "/usr/bin/sleep"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .unwrap()
}

/// Wait until a published status satisfies `predicate`.
pub(crate) async fn wait_for_status(
    rx: &mut watch::Receiver<InstanceStatus>,
    predicate: impl FnMut(&InstanceStatus) -> bool,
) -> InstanceStatus {
    tokio::time::timeout(Duration::from_secs(10), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for status")
        .expect("status channel closed")
        .clone()
}

/// Poll until `pid` is gone or the timeout hits.
pub(crate) async fn wait_until_dead(pid: u32) -> bool {
    for _ in 0..100 {
        if !crate::process::os::is_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
