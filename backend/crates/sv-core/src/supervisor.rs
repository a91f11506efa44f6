//! Per-instance lifecycle state machine.
//!
//! ```text
//!             start / adopt                 exit or hung
//!   Stopped ───────────────► Running ─────────────────────► Restarting
//!      ▲                      │   ▲                             │
//!      │        stop          │   └──────── respawn ────────────┤
//!      ├──────────────────────┘                                 │ budget spent,
//!      │        stop / reset                                    │ render/update failure
//!      └──────────────────────── Errored ◄──────────────────────┘
//! ```
//!
//! Every command and every watcher event holds the instance lock for its
//! whole transition. Watchers never take the lock; they report to the event
//! loop over a channel, tagged with the epoch of the Running scope that
//! spawned them. Events from an older epoch are dropped.

use crate::{
    Action, InstanceParts, InstanceStatus, PersistenceStore, ProcessController, ProcessHealth,
    ProcessMonitor, ProcessTable, Renderer, RestartPolicy, StateKind, SupervisorError,
    SupervisorResult, Updater,
};

use sv_config::{SupervisorConfig, UpdateCheckPolicy};

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

enum InstanceState {
    Stopped,
    Running(RunningScope),
    Restarting,
    Errored(Arc<SupervisorError>),
}

impl InstanceState {
    fn kind(&self) -> StateKind {
        match self {
            InstanceState::Stopped => StateKind::Stopped,
            InstanceState::Running(_) => StateKind::Running,
            InstanceState::Restarting => StateKind::Restarting,
            InstanceState::Errored(_) => StateKind::Errored,
        }
    }
}

/// Watchers of one Running period.
struct RunningScope {
    token: CancellationToken,
    watchers: Vec<JoinHandle<()>>,
    epoch: u64,
}

#[derive(Debug)]
struct WatchEvent {
    epoch: u64,
    kind: WatchEventKind,
}

#[derive(Debug)]
enum WatchEventKind {
    Exited(Option<ExitStatus>),
    HealthCheckFailed(String),
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEventKind::Exited(Some(status)) => write!(f, "process exited ({status})"),
            WatchEventKind::Exited(None) => f.write_str("process exited"),
            WatchEventKind::HealthCheckFailed(reason) => {
                write!(f, "health check failed: {reason}")
            }
        }
    }
}

enum Cause {
    /// Requested by the operator; does not count against the budget
    Planned,
    Unplanned(String),
}

enum Next {
    Running,
    Restarting(Cause),
    Stopped,
    Errored(SupervisorError),
}

struct Inner {
    state: InstanceState,
    controller: ProcessController,
    policy: RestartPolicy,
    renderer: Arc<dyn Renderer>,
    updater: Arc<dyn Updater>,
    store: Arc<dyn PersistenceStore>,
    last_epoch: u64,
}

impl Inner {
    fn guard(&self, action: Action) -> SupervisorResult<()> {
        let allowed = matches!(
            (action, &self.state),
            (Action::Start | Action::Adopt, InstanceState::Stopped)
                | (
                    Action::Stop,
                    InstanceState::Running(_) | InstanceState::Errored(_)
                )
                | (Action::Restart, InstanceState::Running(_))
                | (Action::Reset, InstanceState::Errored(_))
        );

        if allowed {
            Ok(())
        } else {
            Err(SupervisorError::action_not_allowed(action, self.state.kind()))
        }
    }
}

struct Shared {
    path: PathBuf,
    inner: Mutex<Inner>,
    status: watch::Sender<InstanceStatus>,
    events: mpsc::UnboundedSender<WatchEvent>,
    root: CancellationToken,
    stop_grace: Duration,
    health_interval: Duration,
    render_interval: Duration,
    update_check: UpdateCheckPolicy,
}

/// Supervises one server installation.
///
/// Commands return the resulting status, or the recorded error when the
/// transition ended in Errored.
pub struct InstanceSupervisor {
    shared: Arc<Shared>,
    event_loop: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl InstanceSupervisor {
    /// Must be called inside a tokio runtime; spawns the event loop.
    pub fn new(
        path: PathBuf,
        parts: InstanceParts,
        store: Arc<dyn PersistenceStore>,
        table: ProcessTable,
        config: &SupervisorConfig,
        parent: &CancellationToken,
    ) -> Self {
        let controller = ProcessController::new(parts.launch, table, config.kill_timeout());
        let (status, _) = watch::channel(InstanceStatus::stopped(path.clone()));
        let (events, events_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            path,
            inner: Mutex::new(Inner {
                state: InstanceState::Stopped,
                controller,
                policy: RestartPolicy::from_config(config),
                renderer: parts.renderer,
                updater: parts.updater,
                store,
                last_epoch: 0,
            }),
            status,
            events,
            root: parent.child_token(),
            stop_grace: config.stop_grace(),
            health_interval: config.health_interval(),
            render_interval: config.render_interval(),
            update_check: config.update_check,
        });

        let event_loop = tokio::spawn(Arc::clone(&shared).run_event_loop(events_rx));

        Self {
            shared,
            event_loop: std::sync::Mutex::new(Some(event_loop)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Latest published status. Never waits on a transition.
    pub fn status(&self) -> InstanceStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<InstanceStatus> {
        self.shared.status.subscribe()
    }

    pub async fn last_error(&self) -> Option<Arc<SupervisorError>> {
        match &self.shared.inner.lock().await.state {
            InstanceState::Errored(error) => Some(Arc::clone(error)),
            _ => None,
        }
    }

    /// Unplanned restarts in the current window, with expiry applied.
    pub async fn restart_count(&self) -> u32 {
        self.shared.inner.lock().await.policy.count()
    }

    pub async fn start(&self) -> SupervisorResult<InstanceStatus> {
        let mut inner = self.lock_live().await?;
        inner.guard(Action::Start)?;

        info!(path = %self.shared.path.display(), "Starting server");
        self.shared.drive(&mut inner, Next::Running).await;
        self.shared.outcome(&inner)
    }

    /// Stop the server. A no-op when already stopped.
    pub async fn stop(&self) -> SupervisorResult<InstanceStatus> {
        let mut inner = self.lock_live().await?;
        if matches!(inner.state, InstanceState::Stopped) {
            debug!(path = %self.shared.path.display(), "Stop ignored, already stopped");
            return Ok(self.status());
        }
        inner.guard(Action::Stop)?;

        info!(path = %self.shared.path.display(), pid = ?inner.controller.pid(), "Stopping server");
        if matches!(inner.state, InstanceState::Running(_)) {
            if let Err(error) = inner.controller.signal_terminate() {
                debug!(path = %self.shared.path.display(), "Graceful signal failed: {error}");
            }
            tokio::time::sleep(self.shared.stop_grace).await;
        }

        self.shared.drive(&mut inner, Next::Stopped).await;
        self.shared.outcome(&inner)
    }

    /// Planned restart. Does not count against the restart budget.
    pub async fn restart(&self) -> SupervisorResult<InstanceStatus> {
        let mut inner = self.lock_live().await?;
        inner.guard(Action::Restart)?;

        info!(path = %self.shared.path.display(), "Restarting server on request");
        self.shared
            .drive(&mut inner, Next::Restarting(Cause::Planned))
            .await;
        self.shared.outcome(&inner)
    }

    /// Leave Errored for Stopped.
    pub async fn reset(&self) -> SupervisorResult<InstanceStatus> {
        let mut inner = self.lock_live().await?;
        inner.guard(Action::Reset)?;

        info!(path = %self.shared.path.display(), "Resetting errored server");
        self.shared.drive(&mut inner, Next::Stopped).await;
        self.shared.outcome(&inner)
    }

    /// Attach to a server left running by an earlier daemon run.
    ///
    /// A rejected PID leaves the instance Stopped.
    pub async fn adopt(&self, pid: u32) -> SupervisorResult<InstanceStatus> {
        let mut inner = self.lock_live().await?;
        inner.guard(Action::Adopt)?;

        inner.controller.adopt(pid)?;
        info!(path = %self.shared.path.display(), pid, "Adopting running server");
        self.shared.drive(&mut inner, Next::Running).await;
        self.shared.outcome(&inner)
    }

    /// Stop supervising without terminating the server process.
    pub async fn shutdown(&self) {
        self.shared.root.cancel();

        let event_loop = self
            .event_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(event_loop) = event_loop {
            let _ = event_loop.await;
        }

        let mut inner = self.shared.inner.lock().await;
        self.shared.close_scope(&mut inner).await;
        inner.controller.release();
        info!(path = %self.shared.path.display(), "Supervisor shut down");
    }

    #[cfg(test)]
    pub(crate) async fn refuse_termination(&self) {
        self.shared.inner.lock().await.controller.refuse_termination();
    }

    async fn lock_live(&self) -> SupervisorResult<tokio::sync::MutexGuard<'_, Inner>> {
        let inner = self.shared.inner.lock().await;
        if self.shared.root.is_cancelled() {
            return Err(SupervisorError::internal("supervisor is shut down"));
        }
        Ok(inner)
    }
}

impl Drop for InstanceSupervisor {
    fn drop(&mut self) {
        self.shared.root.cancel();
    }
}

impl Shared {
    async fn run_event_loop(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<WatchEvent>) {
        loop {
            tokio::select! {
                biased;
                _ = self.root.cancelled() => break,
                Some(event) = events.recv() => self.handle_event(event).await,
            }
        }
        debug!(path = %self.path.display(), "Event loop ended");
    }

    async fn handle_event(&self, event: WatchEvent) {
        let mut inner = self.inner.lock().await;

        let current = match &inner.state {
            InstanceState::Running(scope) => scope.epoch,
            _ => {
                debug!(path = %self.path.display(), epoch = event.epoch, "Event ignored, not running");
                return;
            }
        };
        if current != event.epoch {
            debug!(path = %self.path.display(), epoch = event.epoch, current, "Stale event ignored");
            return;
        }

        warn!(
            path = %self.path.display(),
            pid = ?inner.controller.pid(),
            "Unplanned stop: {}", event.kind
        );
        self.drive(
            &mut inner,
            Next::Restarting(Cause::Unplanned(event.kind.to_string())),
        )
        .await;
    }

    /// Run entry actions until the instance settles in a state.
    async fn drive(&self, inner: &mut Inner, first: Next) {
        let mut next = Some(first);
        while let Some(step) = next.take() {
            next = match step {
                Next::Running => self.enter_running(inner).await,
                Next::Restarting(cause) => self.enter_restarting(inner, cause).await,
                Next::Stopped => self.enter_stopped(inner).await,
                Next::Errored(error) => {
                    self.enter_errored(inner, error).await;
                    None
                }
            };
        }
    }

    async fn enter_running(&self, inner: &mut Inner) -> Option<Next> {
        if let Err(error) = inner.renderer.render().await {
            return Some(Next::Errored(error));
        }

        let pid = match inner.controller.pid() {
            Some(pid) => pid,
            None => match inner.controller.start() {
                Ok(pid) => pid,
                Err(error) if error.is_transient() => {
                    warn!(path = %self.path.display(), "{error}");
                    return Some(Next::Restarting(Cause::Unplanned(error.summary())));
                }
                Err(error) => return Some(Next::Errored(error)),
            },
        };

        if let Err(error) = inner.store.store_pid(&self.path, Some(pid)) {
            return Some(Next::Errored(error));
        }

        let monitor = match inner.controller.monitor() {
            Ok(monitor) => monitor,
            Err(error) => return Some(Next::Errored(error)),
        };

        inner.last_epoch += 1;
        let epoch = inner.last_epoch;
        let token = self.root.child_token();
        let watchers = vec![
            tokio::spawn(liveness_watcher(
                monitor,
                token.clone(),
                self.health_interval,
                epoch,
                self.events.clone(),
            )),
            tokio::spawn(render_ticker(
                Arc::clone(&inner.renderer),
                token.clone(),
                self.render_interval,
                self.path.clone(),
            )),
        ];

        inner.state = InstanceState::Running(RunningScope {
            token,
            watchers,
            epoch,
        });
        self.publish(inner);

        info!(path = %self.path.display(), pid, epoch, "Server running");
        None
    }

    async fn enter_restarting(&self, inner: &mut Inner, cause: Cause) -> Option<Next> {
        self.close_scope(inner).await;
        inner.state = InstanceState::Restarting;
        self.publish(inner);

        // The old process may still be alive; never update or spawn next to it
        if let Err(error) = inner.controller.stop().await {
            return Some(Next::Errored(error));
        }
        if let Err(error) = inner.store.store_pid(&self.path, None) {
            return Some(Next::Errored(error));
        }

        let planned = match &cause {
            Cause::Planned => true,
            Cause::Unplanned(reason) => {
                inner.policy.increment();
                self.publish(inner);

                if inner.policy.limit_reached() {
                    return Some(Next::Errored(SupervisorError::max_restarts(
                        inner.policy.max_restarts(),
                        inner.policy.window().as_secs(),
                        reason.clone(),
                    )));
                }

                warn!(
                    path = %self.path.display(),
                    restarts = inner.policy.count(),
                    max = inner.policy.max_restarts(),
                    "Restarting after: {reason}"
                );
                false
            }
        };

        if self.should_check_update(planned, inner.policy.count()) {
            match inner.updater.is_new_version_available().await {
                Ok(true) => {
                    if let Err(error) = inner.updater.update().await {
                        return Some(Next::Errored(error));
                    }
                }
                Ok(false) => {}
                Err(error) => warn!(
                    path = %self.path.display(),
                    "Update check failed, restarting without update: {}",
                    error.summary()
                ),
            }
        }

        Some(Next::Running)
    }

    async fn enter_stopped(&self, inner: &mut Inner) -> Option<Next> {
        self.close_scope(inner).await;

        if inner.controller.is_owned() {
            if let Err(error) = inner.controller.stop().await {
                warn!(path = %self.path.display(), "Terminating server failed: {error}");
            }
        } else {
            match inner.store.read_pid(&self.path) {
                Ok(Some(pid)) => {
                    if let Err(error) = inner.controller.terminate_stray(pid).await {
                        warn!(path = %self.path.display(), pid, "Terminating leftover process failed: {error}");
                    }
                }
                Ok(None) => {}
                Err(error) => warn!(path = %self.path.display(), "Reading persisted PID failed: {error}"),
            }
        }

        inner.policy.reset();
        inner.state = InstanceState::Stopped;
        if let Err(error) = inner.store.store_pid(&self.path, None) {
            return Some(Next::Errored(error));
        }
        self.publish(inner);

        info!(path = %self.path.display(), "Server stopped");
        None
    }

    async fn enter_errored(&self, inner: &mut Inner, error: SupervisorError) {
        self.close_scope(inner).await;

        error!(
            path = %self.path.display(),
            code = error.error_code(),
            "Server errored: {error}"
        );
        inner.state = InstanceState::Errored(Arc::new(error));
        self.publish(inner);
    }

    /// Cancel and join the watchers of the current Running scope, if any.
    async fn close_scope(&self, inner: &mut Inner) {
        if let InstanceState::Running(scope) = &mut inner.state {
            scope.token.cancel();
            for watcher in scope.watchers.drain(..) {
                if let Err(e) = watcher.await
                    && e.is_panic()
                {
                    error!(path = %self.path.display(), "Watcher panicked: {e}");
                }
            }
        }
    }

    fn should_check_update(&self, planned: bool, restarts: u32) -> bool {
        match self.update_check {
            UpdateCheckPolicy::EveryRestart => true,
            UpdateCheckPolicy::FirstInStreak => planned || restarts <= 1,
            UpdateCheckPolicy::Never => false,
        }
    }

    fn outcome(&self, inner: &Inner) -> SupervisorResult<InstanceStatus> {
        match &inner.state {
            InstanceState::Errored(error) => Err(SupervisorError::Recorded(Arc::clone(error))),
            _ => Ok(self.status.borrow().clone()),
        }
    }

    fn publish(&self, inner: &Inner) {
        let last_error = match &inner.state {
            InstanceState::Errored(error) => Some(error.summary()),
            _ => None,
        };

        self.status.send_replace(InstanceStatus {
            path: self.path.clone(),
            state: inner.state.kind(),
            pid: inner.controller.pid(),
            restarts: inner.policy.count(),
            last_error,
            updated_at: Utc::now(),
        });
    }
}

/// Reports the first exit or failed probe of the current process.
async fn liveness_watcher(
    monitor: ProcessMonitor,
    token: CancellationToken,
    interval: Duration,
    epoch: u64,
    events: mpsc::UnboundedSender<WatchEvent>,
) {
    let mut exit = monitor.exit_signal();
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let kind = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            status = exit.exited() => break WatchEventKind::Exited(status),
            _ = ticker.tick() => match monitor.health().await {
                ProcessHealth::Healthy => {}
                ProcessHealth::Exited => break WatchEventKind::Exited(None),
                ProcessHealth::Hung { reason } => break WatchEventKind::HealthCheckFailed(reason),
            },
        }
    };

    let _ = events.send(WatchEvent { epoch, kind });
}

/// Re-renders configuration while the server runs. Failures only warn.
async fn render_ticker(
    renderer: Arc<dyn Renderer>,
    token: CancellationToken,
    interval: Duration,
    path: PathBuf,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = renderer.render() => {
                if let Err(error) = result {
                    warn!(path = %path.display(), "Periodic render failed: {}", error.summary());
                }
            }
        }
    }
}
