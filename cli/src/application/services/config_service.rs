//! Application service — installer config use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::InstallerConfig;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<InstallerConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &InstallerConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist a single `key = value`, returning the updated config.
///
/// Nothing is written when the key or value is rejected.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<InstallerConfig> {
    let mut config = store.load()?;
    config.set(key, value)?;
    store.save(&config)?;
    Ok(config)
}
