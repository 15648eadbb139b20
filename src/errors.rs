// src/errors.rs

//! Crate-wide error taxonomy.
//!
//! - `ConfigError` is fatal at startup (bad config, nothing to watch).
//! - `SpawnError` is recoverable: it is reported to the output sink and the
//!   loop keeps watching.
//! - A non-zero exit of the command is *not* an error of this crate; it is
//!   reported as a normal [`RunOutcome`](crate::engine::RunOutcome).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchRunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to spawn `{program}`: {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchRunError>;
