use crate::CliClientResult;

use sv_core::{FileStore, INSTANCE_DIR, InstanceSettings};

use std::path::Path;

use serde_json::{Value, json};

/// Initialize a server installation locally. The daemon is not involved.
pub fn init_instance(path: &Path) -> CliClientResult<Value> {
    let instance = InstanceSettings::initialize(path)?;

    Ok(json!({
        "initialized": instance,
        "settings": instance.join(INSTANCE_DIR).join("config.toml"),
        "cache": FileStore::cache_path(&instance),
    }))
}
