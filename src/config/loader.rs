// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{RawConfigFile, WatchRunConfig};
use crate::errors::{Result, WatchRunError};

/// Config file picked up from the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "WatchRun.toml";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; defaults and validation happen in
/// `WatchRunConfig::try_from`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        WatchRunError::ConfigError(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load the config named on the command line, or the default file if it
/// exists in `root`.
///
/// - An explicit path that cannot be read is an error.
/// - A missing default file just means "no config file".
pub fn load_optional(explicit: Option<&Path>, root: &Path) -> Result<RawConfigFile> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    let default_path = root.join(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        debug!(path = %default_path.display(), "using default config file");
        load_from_path(default_path)
    } else {
        Ok(RawConfigFile::default())
    }
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WatchRunConfig> {
    let raw_config = load_from_path(&path)?;
    let config = WatchRunConfig::try_from(raw_config)?;
    Ok(config)
}
