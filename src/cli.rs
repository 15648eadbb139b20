// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ConfigOverrides;
use crate::types::TerminatedOutput;

/// Command-line arguments for `watch-run`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watch-run",
    version,
    about = "Re-run a test (or any command) whenever watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Test name, appended as a filter argument to the command
    /// (`cargo test <TEST_NAME>` by default).
    #[arg(value_name = "TEST_NAME")]
    pub test_name: Option<String>,

    /// Command to run instead of `cargo test`, given after `--`.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,

    /// Path or glob to watch (repeatable).
    ///
    /// Default: `src` and `Cargo.toml` in the current directory.
    #[arg(short = 'w', long = "watch", value_name = "PATH")]
    pub watch: Vec<String>,

    /// Glob of paths whose changes are ignored (repeatable).
    #[arg(short = 'i', long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Quiet period after the last change before the command is (re)started.
    #[arg(short = 'd', long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// How long a superseded run gets to exit after SIGTERM before it is killed.
    #[arg(long, value_name = "MS")]
    pub kill_timeout_ms: Option<u64>,

    /// What to do with output of a run that gets terminated.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub terminated_output: Option<TerminatedOutput>,

    /// Do not run the command at startup; wait for the first change.
    #[arg(long, conflicts_with = "once")]
    pub no_initial_run: bool,

    /// Run the command once and exit with its status, no watching.
    #[arg(long)]
    pub once: bool,

    /// Resolve and print the configuration, but don't watch or run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Path to a `WatchRun.toml` config file.
    ///
    /// Without this flag `WatchRun.toml` in the current directory is used if
    /// it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCH_RUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Flags that take precedence over the config file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            watch: self.watch.clone(),
            exclude: self.ignore.clone(),
            debounce_ms: self.debounce_ms,
            command: self.command.clone(),
            filter: self.test_name.clone(),
            kill_timeout_ms: self.kill_timeout_ms,
            terminated_output: self.terminated_output,
            no_initial_run: self.no_initial_run,
            once: self.once,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
