use crate::{SupervisorError, SupervisorResult};

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Per-instance settings directory. Its presence marks an initialized server.
pub const INSTANCE_DIR: &str = ".svctl";
const CACHE_FILENAME: &str = ".cache.json";
const NO_PID: i64 = -1;

/// Durable state the supervisor needs across daemon restarts.
pub trait PersistenceStore: Send + Sync {
    /// Record the owned PID of `instance`; `None` means no process.
    fn store_pid(&self, instance: &Path, pid: Option<u32>) -> SupervisorResult<()>;

    fn read_pid(&self, instance: &Path) -> SupervisorResult<Option<u32>>;

    fn registered_paths(&self) -> SupervisorResult<Vec<PathBuf>>;

    fn append_registered_path(&self, instance: &Path) -> SupervisorResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct InstanceCache {
    pid: i64,
}

impl Default for InstanceCache {
    fn default() -> Self {
        Self { pid: NO_PID }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DaemonState {
    #[serde(default)]
    servers: Vec<PathBuf>,
}

/// JSON files on disk.
///
/// - `<instance>/.svctl/.cache.json` holds `{"pid": N}` with `-1` for none
/// - the daemon state file holds `{"servers": [..]}`
///
/// Writes go to a sibling temp file that is then renamed over the target.
pub struct FileStore {
    state_file: PathBuf,
    state_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            state_lock: Mutex::new(()),
        }
    }

    pub fn cache_path(instance: &Path) -> PathBuf {
        instance.join(INSTANCE_DIR).join(CACHE_FILENAME)
    }

    fn read_state(&self) -> SupervisorResult<DaemonState> {
        Ok(read_json(&self.state_file)?.unwrap_or_default())
    }
}

impl PersistenceStore for FileStore {
    fn store_pid(&self, instance: &Path, pid: Option<u32>) -> SupervisorResult<()> {
        let cache = InstanceCache {
            pid: pid.map(i64::from).unwrap_or(NO_PID),
        };
        write_json_atomic(&Self::cache_path(instance), &cache)
    }

    fn read_pid(&self, instance: &Path) -> SupervisorResult<Option<u32>> {
        let cache: InstanceCache = read_json(&Self::cache_path(instance))?.unwrap_or_default();
        Ok(u32::try_from(cache.pid).ok().filter(|pid| *pid > 0))
    }

    fn registered_paths(&self) -> SupervisorResult<Vec<PathBuf>> {
        let _guard = self.state_lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_state()?.servers)
    }

    fn append_registered_path(&self, instance: &Path) -> SupervisorResult<()> {
        let _guard = self.state_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut state = self.read_state()?;
        if state.servers.iter().any(|existing| existing == instance) {
            return Ok(());
        }
        state.servers.push(instance.to_path_buf());

        write_json_atomic(&self.state_file, &state)
    }
}

/// Write a cache holding no PID for a freshly initialized instance.
pub(crate) fn write_empty_cache(instance: &Path) -> SupervisorResult<()> {
    write_json_atomic(&FileStore::cache_path(instance), &InstanceCache::default())
}

/// `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> SupervisorResult<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SupervisorError::io(path, e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| SupervisorError::persistence(path, format!("invalid JSON: {e}")))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> SupervisorResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| SupervisorError::persistence(path, "path has no parent directory"))?;
    std::fs::create_dir_all(dir).map_err(|e| SupervisorError::io(dir, e))?;

    let content = serde_json::to_vec_pretty(value)
        .map_err(|e| SupervisorError::persistence(path, format!("serialize failed: {e}")))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = std::fs::File::create(&tmp_path).map_err(|e| SupervisorError::io(&tmp_path, e))?;
    file.write_all(&content)
        .and_then(|()| file.sync_all())
        .map_err(|e| SupervisorError::io(&tmp_path, e))?;
    drop(file);

    std::fs::rename(&tmp_path, path).map_err(|e| SupervisorError::io(path, e))
}
