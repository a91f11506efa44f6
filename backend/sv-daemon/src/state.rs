use sv_core::SupervisorRegistry;

use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SupervisorRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<SupervisorRegistry>) -> Self {
        Self { registry }
    }
}
