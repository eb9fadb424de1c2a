//! Application service — configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{DumpConfig, apply_config_value};

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<DumpConfig> {
    store.load()
}

/// Save configuration.
pub fn save_config(store: &impl ConfigStore, config: &DumpConfig) -> Result<()> {
    store.save(config)
}

/// Validate `key = value`, apply it to the stored configuration, and save.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the store fails.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<DumpConfig> {
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    save_config(store, &config)?;
    Ok(config)
}
