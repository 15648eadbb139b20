// src/config/mod.rs

//! Configuration loading and validation for watch-run.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and CLI overrides (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Merge, apply defaults and validate into a [`WatchRunConfig`]
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, load_optional};
pub use model::{
    CommandSection, ConfigOverrides, RawConfigFile, RunSection, WatchRunConfig, WatchSection,
};
