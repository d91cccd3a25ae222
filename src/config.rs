// src/config.rs

//! Configuration loading utilities.
//!
//! Resolves the state directory and loads the target list from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Config, Target};

/// Name of the state directory under the user's configuration directory.
pub const APP_DIR: &str = "pagewatch";

pub const CONFIG_FILE: &str = "config.toml";
pub const UPDATES_FILE: &str = "updates.json";

/// Default state directory: `$HOME/.config/pagewatch`.
#[cfg(not(windows))]
pub fn default_root_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config").join(APP_DIR))
        .ok_or_else(|| AppError::config("HOME is not set; pass --root"))
}

/// Default state directory: `%APPDATA%\pagewatch`.
#[cfg(windows)]
pub fn default_root_dir() -> Result<PathBuf> {
    std::env::var_os("APPDATA")
        .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
        .ok_or_else(|| AppError::config("APPDATA is not set; pass --root"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn updates_path(root: &Path) -> PathBuf {
    root.join(UPDATES_FILE)
}

/// Load the configuration file and build its targets.
///
/// A missing or broken file is an error: there is nothing to watch without
/// targets.
pub fn load_targets(path: &Path) -> Result<(Config, Vec<Arc<Target>>)> {
    let config = Config::load(path)
        .map_err(|e| AppError::config(format!("Failed to load {}: {e}", path.display())))?;
    let targets = config.targets()?;
    log::debug!("Loaded {} target(s) from {}", targets.len(), path.display());
    Ok((config, targets))
}
