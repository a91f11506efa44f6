use std::time::Duration;

use sv_config::SupervisorConfig;
use tokio::time::Instant;

/// Bounded retry budget for unplanned restarts.
///
/// The count resets once a full `window` passes without an increment. The
/// deadline is a monotonic instant checked lazily, so there is no timer to
/// cancel when the instance stops.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    max_restarts: u32,
    window: Duration,
    count: u32,
    deadline: Option<Instant>,
}

impl RestartPolicy {
    pub fn new(max_restarts: u32, window: Duration) -> Self {
        Self {
            max_restarts,
            window,
            count: 0,
            deadline: None,
        }
    }

    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self::new(config.max_restarts, config.restart_window())
    }

    /// Record one unplanned restart and push the reset deadline out.
    pub fn increment(&mut self) {
        self.expire();
        self.count = self.count.saturating_add(1);
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn limit_reached(&mut self) -> bool {
        self.expire();
        self.count >= self.max_restarts
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.deadline = None;
    }

    /// Current count with expiry applied, without mutating.
    pub fn count(&self) -> u32 {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => 0,
            _ => self.count,
        }
    }

    pub fn max_restarts(&self) -> u32 {
        self.max_restarts
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn expire(&mut self) {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            self.reset();
        }
    }
}
