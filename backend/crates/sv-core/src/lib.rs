//! Supervision core: process control, restart budget, per-instance state
//! machine and the registry the daemon drives.

pub mod action;
pub mod error;
pub mod factory;
pub mod instance_settings;
pub mod process;
pub mod registry;
pub mod render;
pub mod restart_policy;
pub mod state;
pub mod store;
pub mod supervisor;
pub mod update;

pub use action::Action;
pub use error::{Result as SupervisorResult, SupervisorError};
pub use factory::{InstanceFactory, InstanceParts, ServerFactory};
pub use instance_settings::{InstanceSettings, RenderSettings, UpdateSettings};
pub use process::{
    ExitSignal, LaunchSpec, ProcessController, ProcessHealth, ProcessMonitor, ProcessTable,
};
pub use registry::{RecoveryFailure, RecoveryReport, SupervisorRegistry};
pub use render::{CommandRenderer, NoopRenderer, Renderer};
pub use restart_policy::RestartPolicy;
pub use state::{InstanceStatus, StateKind};
pub use store::{FileStore, INSTANCE_DIR, PersistenceStore};
pub use supervisor::InstanceSupervisor;
pub use update::{ModUpdater, NoopUpdater, Updater, compare_versions};

#[cfg(test)]
mod tests;
