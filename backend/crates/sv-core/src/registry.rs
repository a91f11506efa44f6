use crate::store::INSTANCE_DIR;
use crate::{
    InstanceFactory, InstanceStatus, InstanceSupervisor, PersistenceStore, ProcessTable,
    SupervisorError, SupervisorResult,
};

use sv_config::SupervisorConfig;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of re-attaching to the servers of an earlier daemon run.
#[derive(Debug, Default)]
pub struct RecoveryReport {
    /// Supervisors recreated from persisted state
    pub registered: Vec<PathBuf>,
    /// Instances whose persisted PID was adopted
    pub adopted: Vec<(PathBuf, u32)>,
    /// Instances whose persisted PID was dead or foreign and reset to -1
    pub corrected: Vec<(PathBuf, u32)>,
    pub failures: Vec<RecoveryFailure>,
}

#[derive(Debug)]
pub struct RecoveryFailure {
    /// `None` when the registered-paths file itself could not be read
    pub path: Option<PathBuf>,
    pub error: SupervisorError,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Adoption {
    NothingPersisted,
    Adopted(u32),
    Corrected(u32),
}

/// All supervisors of this daemon, keyed by canonical instance path.
pub struct SupervisorRegistry {
    supervisors: RwLock<HashMap<PathBuf, Arc<InstanceSupervisor>>>,
    factory: Arc<dyn InstanceFactory>,
    store: Arc<dyn PersistenceStore>,
    table: ProcessTable,
    config: SupervisorConfig,
    root: CancellationToken,
    /// Serializes register and recover
    registering: Mutex<()>,
}

impl SupervisorRegistry {
    pub fn new(
        factory: Arc<dyn InstanceFactory>,
        store: Arc<dyn PersistenceStore>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            supervisors: RwLock::new(HashMap::new()),
            factory,
            store,
            table: ProcessTable::new(),
            config,
            root: CancellationToken::new(),
            registering: Mutex::new(()),
        }
    }

    pub fn process_table(&self) -> &ProcessTable {
        &self.table
    }

    /// Start supervising the server at `path`.
    ///
    /// A PID persisted by an earlier run is adopted when it still verifies.
    /// The supervisor becomes visible to other commands only after that.
    pub async fn register(&self, path: &Path) -> SupervisorResult<InstanceStatus> {
        let path = canonicalize_instance(path)?;

        let _registering = self.registering.lock().await;
        if self.supervisors.read().await.contains_key(&path) {
            return Err(SupervisorError::already_registered(path));
        }

        let supervisor = Arc::new(self.create(&path)?);
        match self.adopt_persisted(&supervisor).await {
            Ok(Adoption::Adopted(pid)) => info!(path = %path.display(), pid, "Adopted running server"),
            Ok(Adoption::Corrected(_) | Adoption::NothingPersisted) => {}
            Err(error) => warn!(path = %path.display(), "Adopting persisted PID failed: {error}"),
        }

        if let Err(error) = self.store.append_registered_path(&path) {
            supervisor.shutdown().await;
            return Err(error);
        }
        self.supervisors
            .write()
            .await
            .insert(path.clone(), Arc::clone(&supervisor));
        info!(path = %path.display(), "Server registered");

        Ok(supervisor.status())
    }

    pub async fn start(&self, path: &Path) -> SupervisorResult<InstanceStatus> {
        self.lookup(path).await?.start().await
    }

    pub async fn stop(&self, path: &Path) -> SupervisorResult<InstanceStatus> {
        self.lookup(path).await?.stop().await
    }

    pub async fn restart(&self, path: &Path) -> SupervisorResult<InstanceStatus> {
        self.lookup(path).await?.restart().await
    }

    pub async fn reset(&self, path: &Path) -> SupervisorResult<InstanceStatus> {
        self.lookup(path).await?.reset().await
    }

    pub async fn status(&self, path: &Path) -> SupervisorResult<InstanceStatus> {
        Ok(self.lookup(path).await?.status())
    }

    /// Status of every registered instance, ordered by path.
    pub async fn list(&self) -> Vec<InstanceStatus> {
        let supervisors = self.supervisors.read().await;
        let mut statuses: Vec<_> = supervisors.values().map(|s| s.status()).collect();
        statuses.sort_by(|a, b| a.path.cmp(&b.path));
        statuses
    }

    pub async fn len(&self) -> usize {
        self.supervisors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Recreate supervisors for every persisted path and adopt their PIDs.
    ///
    /// One broken instance never stops the others from being recovered.
    pub async fn recover(&self) -> RecoveryReport {
        let _registering = self.registering.lock().await;
        let mut report = RecoveryReport::default();

        let paths = match self.store.registered_paths() {
            Ok(paths) => paths,
            Err(error) => {
                report.failures.push(RecoveryFailure { path: None, error });
                return report;
            }
        };

        for persisted in paths {
            let supervisor = match self.recreate(&persisted).await {
                Ok(Some(supervisor)) => supervisor,
                Ok(None) => continue,
                Err(error) => {
                    warn!(path = %persisted.display(), "Recovering server failed: {error}");
                    report.failures.push(RecoveryFailure {
                        path: Some(persisted),
                        error,
                    });
                    continue;
                }
            };

            let path = supervisor.path().to_path_buf();
            match self.adopt_persisted(&supervisor).await {
                Ok(Adoption::Adopted(pid)) => report.adopted.push((path.clone(), pid)),
                Ok(Adoption::Corrected(pid)) => report.corrected.push((path.clone(), pid)),
                Ok(Adoption::NothingPersisted) => {}
                Err(error) => {
                    warn!(path = %path.display(), "Adopting persisted PID failed: {error}");
                    report.failures.push(RecoveryFailure {
                        path: Some(path.clone()),
                        error,
                    });
                }
            }
            report.registered.push(path);
        }

        info!(
            registered = report.registered.len(),
            adopted = report.adopted.len(),
            corrected = report.corrected.len(),
            failed = report.failures.len(),
            "Recovery complete"
        );
        report
    }

    /// Stop every supervisor loop. Server processes keep running.
    pub async fn shutdown(&self) {
        let _registering = self.registering.lock().await;
        self.root.cancel();

        let supervisors: Vec<_> = self
            .supervisors
            .write()
            .await
            .drain()
            .map(|(_, supervisor)| supervisor)
            .collect();

        for supervisor in supervisors {
            supervisor.shutdown().await;
        }
        info!("All supervisors shut down");
    }

    fn create(&self, path: &Path) -> SupervisorResult<InstanceSupervisor> {
        let parts = self.factory.build(path)?;
        Ok(InstanceSupervisor::new(
            path.to_path_buf(),
            parts,
            Arc::clone(&self.store),
            self.table.clone(),
            &self.config,
            &self.root,
        ))
    }

    /// `Ok(None)` when the path is already supervised.
    async fn recreate(&self, persisted: &Path) -> SupervisorResult<Option<Arc<InstanceSupervisor>>> {
        let path = canonicalize_instance(persisted)?;

        let mut supervisors = self.supervisors.write().await;
        if supervisors.contains_key(&path) {
            return Ok(None);
        }

        let supervisor = Arc::new(self.create(&path)?);
        supervisors.insert(path, Arc::clone(&supervisor));
        Ok(Some(supervisor))
    }

    async fn adopt_persisted(&self, supervisor: &InstanceSupervisor) -> SupervisorResult<Adoption> {
        let path = supervisor.path();
        let Some(pid) = self.store.read_pid(path)? else {
            return Ok(Adoption::NothingPersisted);
        };

        match supervisor.adopt(pid).await {
            Ok(_) => Ok(Adoption::Adopted(pid)),
            Err(error) if matches!(error.root(), SupervisorError::AdoptionRejected { .. }) => {
                info!(
                    path = %path.display(),
                    pid,
                    "Clearing persisted PID: {}",
                    error.summary()
                );
                self.store.store_pid(path, None)?;
                Ok(Adoption::Corrected(pid))
            }
            Err(error) => Err(error),
        }
    }

    async fn lookup(&self, path: &Path) -> SupervisorResult<Arc<InstanceSupervisor>> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.supervisors
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| SupervisorError::not_found(key))
    }
}

/// Canonical path of an initialized server installation.
fn canonicalize_instance(path: &Path) -> SupervisorResult<PathBuf> {
    let canonical = path
        .canonicalize()
        .map_err(|e| SupervisorError::invalid_path(path, e.to_string()))?;

    if !canonical.is_dir() {
        return Err(SupervisorError::invalid_path(canonical, "not a directory"));
    }
    if !canonical.join(INSTANCE_DIR).is_dir() {
        return Err(SupervisorError::not_initialized(canonical));
    }

    Ok(canonical)
}
