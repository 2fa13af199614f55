//! Config file lookup.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use vf_core::config::*;

/// Locations searched, in order, when no config path is given.
const DEFAULT_PATHS: &[&str] = &["./vidforge.toml", "~/.config/vidforge/config.toml"];

/// Load configuration from a TOML file and log any validation warnings.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)
        .with_context(|| format!("Failed to load config file: {:?}", path))?;

    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// Load config from `custom_path`, then the default locations, else defaults.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path in default_locations() {
        if path.exists() {
            return load_config(&path);
        }
    }

    tracing::debug!("No config file found; using defaults");
    Ok(Config::default())
}

fn default_locations() -> impl Iterator<Item = PathBuf> {
    DEFAULT_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
}
