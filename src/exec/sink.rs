// src/exec/sink.rs

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::engine::{RunId, RunOutcome, ScheduledRun, TriggerReason};
use crate::errors::WatchRunError;
use crate::types::StreamKind;
use crate::watch::path_utils::display_relative;

use super::CommandSpec;

/// How many changed paths are listed in the "run started" line.
const MAX_LISTED_PATHS: usize = 3;

/// Final report for one run, handed to the sink once its output is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    pub elapsed: Duration,
}

/// Destination for command output and run status.
///
/// Output chunks are forwarded unchanged, in the order they were read from
/// each pipe. Called from the supervisor's reader tasks, hence `Send + Sync`.
pub trait OutputSink: Send + Sync {
    fn run_started(&self, run: &ScheduledRun, command: &CommandSpec);
    fn output(&self, run_id: RunId, stream: StreamKind, chunk: &[u8]);
    fn run_finished(&self, report: &RunReport);
    fn spawn_failed(&self, run_id: RunId, error: &WatchRunError);
}

/// Writes command output to our own stdout/stderr and status lines, prefixed
/// with `[watch-run]`, to stderr.
#[derive(Debug, Clone, Default)]
pub struct StdioSink {
    root: Option<PathBuf>,
}

impl StdioSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show changed paths relative to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn status(&self, line: &str) {
        let mut err = io::stderr().lock();
        if let Err(e) = writeln!(err, "[watch-run] {line}") {
            debug!(error = %e, "failed to write status line");
        }
    }

    /// The changed paths of a run as listed in its status line: the first
    /// few, relative to the root when one is set.
    pub fn describe_changes(&self, run: &ScheduledRun) -> String {
        let names: Vec<String> = run
            .changed
            .iter()
            .take(MAX_LISTED_PATHS)
            .map(|p| match &self.root {
                Some(root) => display_relative(root, p),
                None => p.display().to_string(),
            })
            .collect();

        let mut text = names.join(", ");
        if run.changed.len() > MAX_LISTED_PATHS {
            text.push_str(&format!(" (+{} more)", run.changed.len() - MAX_LISTED_PATHS));
        }
        text
    }
}

impl OutputSink for StdioSink {
    fn run_started(&self, run: &ScheduledRun, command: &CommandSpec) {
        let line = match run.reason {
            TriggerReason::Initial => format!("#{} running `{command}`", run.run_id),
            TriggerReason::FileChange if run.changed.is_empty() => {
                format!("#{} change detected; running `{command}`", run.run_id)
            }
            TriggerReason::FileChange => format!(
                "#{} {} changed; running `{command}`",
                run.run_id,
                self.describe_changes(run)
            ),
        };
        self.status(&line);
    }

    fn output(&self, run_id: RunId, stream: StreamKind, chunk: &[u8]) {
        let result = match stream {
            StreamKind::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(chunk).and_then(|()| out.flush())
            }
            StreamKind::Stderr => {
                let mut err = io::stderr().lock();
                err.write_all(chunk).and_then(|()| err.flush())
            }
        };
        if let Err(e) = result {
            debug!(run_id, ?stream, error = %e, "failed to forward output");
        }
    }

    fn run_finished(&self, report: &RunReport) {
        self.status(&format!(
            "#{} {} in {:.2}s",
            report.run_id,
            describe_outcome(&report.outcome),
            report.elapsed.as_secs_f64()
        ));
    }

    fn spawn_failed(&self, run_id: RunId, error: &WatchRunError) {
        self.status(&format!("#{run_id} could not start: {error}"));
    }
}

/// Short human description of an outcome, e.g. `failed (exit 101)`.
pub fn describe_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Exited { success: true, .. } => "passed".to_string(),
        RunOutcome::Exited {
            code: Some(code), ..
        } => format!("failed (exit {code})"),
        RunOutcome::Exited { code: None, .. } => "killed by signal".to_string(),
        RunOutcome::Terminated { forced: false } => "terminated".to_string(),
        RunOutcome::Terminated { forced: true } => "terminated (killed after timeout)".to_string(),
        RunOutcome::SpawnFailed(reason) => format!("could not start: {reason}"),
    }
}
