// src/config/validate.rs

use std::time::Duration;

use clap::ValueEnum;

use crate::config::model::{
    DEFAULT_ARGS, DEFAULT_DEBOUNCE_MS, DEFAULT_EXCLUDES, DEFAULT_KILL_TIMEOUT_MS,
    DEFAULT_PROGRAM, DEFAULT_WATCH_PATHS, RawConfigFile, WatchRunConfig,
};
use crate::engine::RuntimeOptions;
use crate::errors::{Result, WatchRunError};
use crate::exec::{CommandSpec, SupervisorOptions};
use crate::types::TerminatedOutput;
use crate::watch::WatchSpec;
use crate::watch::patterns::{compile_globset, split_glob_base};

impl TryFrom<RawConfigFile> for WatchRunConfig {
    type Error = WatchRunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let watch = build_watch_spec(&raw)?;
        let command = build_command_spec(&raw)?;
        let runtime = build_runtime_options(&raw)?;
        let supervisor = SupervisorOptions {
            kill_timeout: Duration::from_millis(
                raw.run.kill_timeout_ms.unwrap_or(DEFAULT_KILL_TIMEOUT_MS),
            ),
            terminated_output: parse_terminated_output(raw.run.terminated_output.as_deref())?,
        };
        Ok(WatchRunConfig::new_unchecked(watch, command, runtime, supervisor))
    }
}

fn build_watch_spec(raw: &RawConfigFile) -> Result<WatchSpec> {
    let paths: Vec<String> = match &raw.watch.paths {
        None => DEFAULT_WATCH_PATHS.iter().map(|s| s.to_string()).collect(),
        Some(paths) if paths.is_empty() => {
            return Err(WatchRunError::ConfigError(
                "no watch paths: [watch].paths is empty".to_string(),
            ));
        }
        Some(paths) => paths.clone(),
    };

    for path in &paths {
        if path.trim().is_empty() {
            return Err(WatchRunError::ConfigError(
                "[watch].paths must not contain empty entries".to_string(),
            ));
        }
        let (_, include) = split_glob_base(path);
        if let Some(glob) = include {
            compile_globset(std::slice::from_ref(&glob))?;
        }
    }

    let exclude: Vec<String> = DEFAULT_EXCLUDES
        .iter()
        .map(|s| s.to_string())
        .chain(raw.watch.exclude.iter().cloned())
        .collect();
    compile_globset(&exclude)?;

    Ok(WatchSpec::new(paths, exclude))
}

fn parse_terminated_output(raw: Option<&str>) -> Result<TerminatedOutput> {
    let Some(raw) = raw else {
        return Ok(TerminatedOutput::default());
    };
    TerminatedOutput::from_str(raw.trim(), true).map_err(|_| {
        WatchRunError::ConfigError(format!(
            "invalid terminated_output {raw:?} (expected \"flush\" or \"discard\")"
        ))
    })
}

fn build_command_spec(raw: &RawConfigFile) -> Result<CommandSpec> {
    let (program, mut args) = match &raw.command.program {
        Some(program) => (program.clone(), raw.command.args.clone()),
        None if raw.command.args.is_empty() => (
            DEFAULT_PROGRAM.to_string(),
            DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
        ),
        None => (DEFAULT_PROGRAM.to_string(), raw.command.args.clone()),
    };

    if program.trim().is_empty() {
        return Err(WatchRunError::ConfigError(
            "[command].program must not be empty".to_string(),
        ));
    }

    if let Some(filter) = &raw.command.filter {
        args.push(filter.clone());
    }

    let mut spec = CommandSpec::new(program, args);
    if let Some(cwd) = &raw.command.cwd {
        spec = spec.with_cwd(cwd.clone());
    }
    Ok(spec)
}

fn build_runtime_options(raw: &RawConfigFile) -> Result<RuntimeOptions> {
    let debounce_ms = raw.watch.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS);
    if debounce_ms == 0 {
        return Err(WatchRunError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    let initial_run = raw.run.initial_run.unwrap_or(true);
    if raw.run.once && !initial_run {
        return Err(WatchRunError::ConfigError(
            "`once` needs the initial run; it cannot be combined with initial_run = false"
                .to_string(),
        ));
    }

    Ok(RuntimeOptions {
        debounce: Duration::from_millis(debounce_ms),
        initial_run,
        exit_when_idle: raw.run.once,
    })
}
