// src/engine/event_handlers.rs

//! Per-event logic of the core state machine.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::state::RunState;
use crate::engine::{RunId, RunOutcome, RuntimeOptions, ScheduledRun, TriggerReason};

/// Side effects the core asks the IO shell to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Terminate whatever is running (bounded), then start this run.
    StartRun(ScheduledRun),
    /// Terminate whatever is running; no new run follows.
    StopRunning,
}

/// Result of feeding one event into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

impl CoreStep {
    pub fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn run(run: ScheduledRun) -> Self {
        Self {
            commands: vec![CoreCommand::StartRun(run)],
            keep_running: true,
        }
    }

    fn exit() -> Self {
        Self {
            commands: vec![CoreCommand::StopRunning],
            keep_running: false,
        }
    }
}

pub fn handle_start(state: &mut RunState, options: &RuntimeOptions) -> CoreStep {
    if !options.initial_run {
        info!("waiting for the first change before running");
        return CoreStep::idle();
    }
    let run = state.begin_run(TriggerReason::Initial, Default::default());
    info!(run_id = run.run_id, "starting initial run");
    CoreStep::run(run)
}

pub fn handle_files_changed(
    state: &mut RunState,
    options: &RuntimeOptions,
    paths: Vec<PathBuf>,
    now: Instant,
) -> CoreStep {
    if state.is_shutting_down() {
        debug!(?paths, "change ignored; loop is shutting down");
        return CoreStep::idle();
    }
    if options.exit_when_idle {
        debug!(?paths, "change ignored; running once");
        return CoreStep::idle();
    }

    debug!(?paths, "change recorded; (re)starting debounce timer");
    state.record_change(paths, now);
    CoreStep::idle()
}

pub fn handle_deadline(state: &mut RunState, now: Instant) -> CoreStep {
    if state.is_shutting_down() {
        return CoreStep::idle();
    }
    let Some(trigger) = state.take_due(now) else {
        return CoreStep::idle();
    };

    if let Some(previous) = state.active_run() {
        info!(previous, "changes detected while running; superseding current run");
    }
    let run = state.begin_run(TriggerReason::FileChange, trigger);
    info!(
        run_id = run.run_id,
        events = run.events,
        changed = ?run.changed,
        "debounce window elapsed; starting run"
    );
    CoreStep::run(run)
}

pub fn handle_run_finished(
    state: &mut RunState,
    options: &RuntimeOptions,
    run_id: RunId,
    outcome: RunOutcome,
) -> CoreStep {
    let spawn_failed = matches!(outcome, RunOutcome::SpawnFailed(_));

    if !state.finish_run(run_id, outcome) {
        debug!(run_id, "ignoring completion of a superseded run");
        return CoreStep::idle();
    }

    if spawn_failed {
        warn!(run_id, "command could not be started; waiting for the next change");
    } else {
        debug!(run_id, "run finished");
    }

    if options.exit_when_idle && !state.has_pending_trigger() {
        info!("single run complete; exiting");
        state.begin_shutdown();
        return CoreStep::exit();
    }
    CoreStep::idle()
}

pub fn handle_shutdown(state: &mut RunState) -> CoreStep {
    if state.is_shutting_down() {
        debug!("shutdown already in progress");
    } else {
        info!(active = ?state.active_run(), "shutdown requested");
    }
    state.begin_shutdown();
    CoreStep::exit()
}
