pub mod controller;
pub mod launch_spec;
pub mod monitor;
pub mod os;
pub mod process_health;
pub mod process_table;
pub mod tasklist;

pub use controller::ProcessController;
pub use launch_spec::LaunchSpec;
pub use monitor::{ExitSignal, ProcessMonitor};
pub use process_health::ProcessHealth;
pub use process_table::ProcessTable;
