#![allow(dead_code)]

use std::path::Path;

use watch_run::config::{RawConfigFile, WatchRunConfig};
use watch_run::types::TerminatedOutput;

/// Builder for `WatchRunConfig` to simplify test setup.
///
/// Starts from an empty config file (so all built-in defaults apply) and
/// goes through the same validation as the binary.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    raw: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program plus args, like a trailing `-- cmd args...`.
    pub fn command(mut self, program: &str, args: &[&str]) -> Self {
        self.raw.command.program = Some(program.to_string());
        self.raw.command.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Run `script` through `sh -c`.
    pub fn shell(self, script: &str) -> Self {
        self.command("sh", &["-c", script])
    }

    pub fn watch(mut self, path: impl AsRef<Path>) -> Self {
        self.raw
            .watch
            .paths
            .get_or_insert_with(Vec::new)
            .push(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn exclude(mut self, glob: &str) -> Self {
        self.raw.watch.exclude.push(glob.to_string());
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.raw.watch.debounce_ms = Some(ms);
        self
    }

    pub fn kill_timeout_ms(mut self, ms: u64) -> Self {
        self.raw.run.kill_timeout_ms = Some(ms);
        self
    }

    pub fn terminated_output(mut self, policy: TerminatedOutput) -> Self {
        self.raw.run.terminated_output = Some(policy.as_str().to_string());
        self
    }

    pub fn initial_run(mut self, val: bool) -> Self {
        self.raw.run.initial_run = Some(val);
        self
    }

    pub fn once(mut self) -> Self {
        self.raw.run.once = true;
        self
    }

    pub fn build(self) -> WatchRunConfig {
        WatchRunConfig::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}
