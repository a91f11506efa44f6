use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(not(windows))]
const SERVER_BINARY_DIR: &str = "bin/amd-64";
#[cfg(not(windows))]
const SERVER_EXECUTABLE: &str = "prbf2_l64ded";
#[cfg(windows)]
const SERVER_EXECUTABLE: &str = "prbf2_w32ded.exe";

const SERVER_ARGS: [&str; 8] = [
    "+modPath",
    "mods/pr",
    "+noStatusMonitor",
    "1",
    "+multi",
    "1",
    "+dedicated",
    "1",
];

/// Everything needed to spawn, and later recognize, a server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Added to the daemon's environment
    pub env: Vec<(OsString, OsString)>,
    pub cwd: PathBuf,
    /// Image a running process must have to be adopted or terminated
    pub expected_exe: PathBuf,
    /// Windows only: start in HIGH_PRIORITY_CLASS
    pub high_priority: bool,
    /// Set the executable bit before spawning (Unix only)
    pub ensure_executable: bool,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self {
            expected_exe: program.clone(),
            program,
            args: Vec::new(),
            env: Vec::new(),
            cwd: cwd.into(),
            high_priority: false,
            ensure_executable: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Launch of the dedicated server installed at `server_path`.
    #[cfg(not(windows))]
    pub fn for_server(server_path: &Path) -> Self {
        let bin_dir = server_path.join(SERVER_BINARY_DIR);
        let mut spec = Self::new(bin_dir.join(SERVER_EXECUTABLE), server_path)
            .env("LD_LIBRARY_PATH", bin_dir.as_os_str());
        spec.args = SERVER_ARGS.iter().map(OsString::from).collect();
        spec.ensure_executable = true;
        spec
    }

    /// Launch of the dedicated server installed at `server_path`.
    #[cfg(windows)]
    pub fn for_server(server_path: &Path) -> Self {
        let mut spec = Self::new(server_path.join(SERVER_EXECUTABLE), server_path);
        spec.args = SERVER_ARGS.iter().map(OsString::from).collect();
        spec.high_priority = true;
        spec
    }
}
