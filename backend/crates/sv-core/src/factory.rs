use crate::{
    CommandRenderer, InstanceSettings, LaunchSpec, ModUpdater, NoopRenderer, NoopUpdater,
    Renderer, SupervisorResult, Updater,
};

use std::path::Path;
use std::sync::Arc;

/// Collaborators of one instance.
pub struct InstanceParts {
    pub launch: LaunchSpec,
    pub renderer: Arc<dyn Renderer>,
    pub updater: Arc<dyn Updater>,
}

/// Builds the collaborators for an instance path.
///
/// The registry goes through this trait so tests can swap in fakes.
pub trait InstanceFactory: Send + Sync {
    fn build(&self, path: &Path) -> SupervisorResult<InstanceParts>;
}

/// Dedicated-server launch plus the collaborators named in
/// `<path>/.svctl/config.toml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerFactory;

impl InstanceFactory for ServerFactory {
    fn build(&self, path: &Path) -> SupervisorResult<InstanceParts> {
        let settings = InstanceSettings::load(path)?;

        let renderer: Arc<dyn Renderer> = if settings.render.command.is_empty() {
            Arc::new(NoopRenderer)
        } else {
            Arc::new(CommandRenderer::new(
                &settings.render.command,
                path,
                settings.render.timeout(),
            )?)
        };

        let updater: Arc<dyn Updater> = if settings.update.enabled {
            Arc::new(ModUpdater::new(
                path,
                settings.update.version_url.clone(),
                settings.update.timeout(),
            )?)
        } else {
            Arc::new(NoopUpdater)
        };

        Ok(InstanceParts {
            launch: LaunchSpec::for_server(path),
            renderer,
            updater,
        })
    }
}
