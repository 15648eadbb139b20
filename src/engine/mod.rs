// src/engine/mod.rs

//! Orchestration engine for watch-run.
//!
//! The loop reacts to:
//! - filesystem changes (debounced into triggers)
//! - run completion events from the executor
//! - stop requests (Ctrl-C, SIGTERM, [`StopHandle::stop`])
//!
//! The pure core state machine lives in [`core`] (with the per-event logic in
//! [`event_handlers`] and the owned [`RunState`] in [`state`]); the async/IO
//! shell is implemented in [`runtime`].

use std::path::PathBuf;
use std::time::Duration;

/// Identifier of one command execution; increases monotonically from 1.
pub type RunId = u64;

/// Why a run was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The run at startup, before any change was seen.
    Initial,
    /// A debounced burst of filesystem changes.
    FileChange,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The command exited on its own. `code` is `None` when it was killed by
    /// a signal it did not get from us.
    Exited { code: Option<i32>, success: bool },
    /// We terminated it (superseded by a newer trigger, or shutdown).
    /// `forced` means it ignored SIGTERM and had to be killed.
    Terminated { forced: bool },
    /// The command could not be launched at all.
    SpawnFailed(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Exited { success: true, .. })
    }
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Quiet period after the last change before a run starts.
    pub debounce: Duration,
    /// Run the command once at startup.
    pub initial_run: bool,
    /// Exit once the current run is done and nothing is pending (`--once`).
    pub exit_when_idle: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            initial_run: true,
            exit_when_idle: false,
        }
    }
}

/// A run the core has decided to start, handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub run_id: RunId,
    pub reason: TriggerReason,
    /// Distinct paths whose changes led to this run (empty for the initial run).
    pub changed: Vec<PathBuf>,
    /// Number of filesystem events coalesced into this run.
    pub events: usize,
}

/// Events flowing into the runtime from the watcher, the executor, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Relevant paths changed on disk.
    FilesChanged { paths: Vec<PathBuf> },
    /// A run ended (exit, or failure to spawn).
    RunFinished { run_id: RunId, outcome: RunOutcome },
    /// Graceful shutdown requested.
    ShutdownRequested,
}

/// Observable state of the loop.
///
/// `Idle -> Debouncing -> Running -> Idle`, with `ShuttingDown` reachable from
/// anywhere and `Stopped` terminal. A change seen while a run is alive puts
/// the loop back into `Debouncing` with the run still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Debouncing,
    Running,
    ShuttingDown,
    Stopped,
}

/// Summary returned when the loop ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub runs_started: u64,
    pub last_outcome: Option<RunOutcome>,
    pub once: bool,
}

impl LoopReport {
    /// Process exit code for `watch-run`.
    ///
    /// Watch mode always exits 0 on a clean stop. In `--once` mode the
    /// command's own status is passed through.
    pub fn exit_code(&self) -> i32 {
        if !self.once {
            return 0;
        }
        match &self.last_outcome {
            None => 0,
            Some(outcome) if outcome.is_success() => 0,
            Some(RunOutcome::Exited { code: Some(code), .. }) => *code,
            Some(_) => 1,
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod state;
pub mod stop;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
pub use state::RunState;
pub use stop::{StopHandle, spawn_signal_listener};
