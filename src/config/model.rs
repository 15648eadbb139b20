// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::RuntimeOptions;
use crate::exec::{CommandSpec, SupervisorOptions};
use crate::types::TerminatedOutput;
use crate::watch::WatchSpec;

pub const DEFAULT_DEBOUNCE_MS: u64 = 200;
pub const DEFAULT_KILL_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_PROGRAM: &str = "cargo";
pub const DEFAULT_ARGS: &[&str] = &["test"];
pub const DEFAULT_WATCH_PATHS: &[&str] = &["src", "Cargo.toml"];

/// Editor swap/backup files, build output and VCS metadata. Always excluded,
/// user excludes are added on top.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*.swp",
    "**/*.swx",
    "**/*~",
    "**/.#*",
    "**/4913",
    "**/target",
    "**/target/**",
    "**/.git",
    "**/.git/**",
];

/// Config file as read from TOML, before defaults and validation.
///
/// ```toml
/// [watch]
/// paths = ["src", "Cargo.toml"]
/// exclude = ["**/*.tmp"]
/// debounce_ms = 200
///
/// [command]
/// program = "cargo"
/// args = ["test"]
/// filter = "parser"
///
/// [run]
/// kill_timeout_ms = 2000
/// terminated_output = "flush"
/// initial_run = true
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub command: CommandSection,

    #[serde(default)]
    pub run: RunSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Paths or globs, relative to the project root. Absent means the
    /// defaults; an explicitly empty list is rejected.
    #[serde(default)]
    pub paths: Option<Vec<String>>,

    /// Extra exclude globs on top of [`DEFAULT_EXCLUDES`].
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

/// `[command]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandSection {
    /// Executable to run. Defaults to `cargo` (with `args = ["test"]` when no
    /// args are given either).
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Appended as the last argument, e.g. a test name.
    #[serde(default)]
    pub filter: Option<String>,

    /// Working directory of the command; inherits ours when unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// `[run]` section: supervision and loop behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunSection {
    #[serde(default)]
    pub kill_timeout_ms: Option<u64>,

    /// `"flush"` or `"discard"`, checked during validation.
    #[serde(default)]
    pub terminated_output: Option<String>,

    #[serde(default)]
    pub initial_run: Option<bool>,

    /// Run once and exit instead of watching.
    #[serde(default)]
    pub once: bool,
}

/// Values coming from the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Replaces `[watch].paths` when non-empty.
    pub watch: Vec<String>,
    /// Appended to `[watch].exclude`.
    pub exclude: Vec<String>,
    pub debounce_ms: Option<u64>,
    /// Program followed by its args; replaces `[command]` when non-empty.
    pub command: Vec<String>,
    pub filter: Option<String>,
    pub kill_timeout_ms: Option<u64>,
    pub terminated_output: Option<TerminatedOutput>,
    pub no_initial_run: bool,
    pub once: bool,
}

impl RawConfigFile {
    /// Layer CLI values over the file values.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if !overrides.watch.is_empty() {
            self.watch.paths = Some(overrides.watch);
        }
        self.watch.exclude.extend(overrides.exclude);
        if overrides.debounce_ms.is_some() {
            self.watch.debounce_ms = overrides.debounce_ms;
        }

        let mut command = overrides.command.into_iter();
        if let Some(program) = command.next() {
            self.command.program = Some(program);
            self.command.args = command.collect();
        }
        if overrides.filter.is_some() {
            self.command.filter = overrides.filter;
        }

        if overrides.kill_timeout_ms.is_some() {
            self.run.kill_timeout_ms = overrides.kill_timeout_ms;
        }
        if let Some(policy) = overrides.terminated_output {
            self.run.terminated_output = Some(policy.as_str().to_string());
        }
        if overrides.no_initial_run {
            self.run.initial_run = Some(false);
        }
        if overrides.once {
            self.run.once = true;
        }
        self
    }
}

/// Fully resolved, validated configuration. Construct via
/// `WatchRunConfig::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct WatchRunConfig {
    pub watch: WatchSpec,
    pub command: CommandSpec,
    pub runtime: RuntimeOptions,
    pub supervisor: SupervisorOptions,
}

impl WatchRunConfig {
    pub(crate) fn new_unchecked(
        watch: WatchSpec,
        command: CommandSpec,
        runtime: RuntimeOptions,
        supervisor: SupervisorOptions,
    ) -> Self {
        Self {
            watch,
            command,
            runtime,
            supervisor,
        }
    }
}
