use std::fmt;

/// Result of one liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessHealth {
    Healthy,
    Exited,
    /// Alive but stuck, e.g. on a modal error dialog
    Hung { reason: String },
}

impl fmt::Display for ProcessHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessHealth::Healthy => f.write_str("healthy"),
            ProcessHealth::Exited => f.write_str("exited"),
            ProcessHealth::Hung { reason } => write!(f, "hung ({reason})"),
        }
    }
}
