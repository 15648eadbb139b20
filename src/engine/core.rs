// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s (plus the current instant) and produces:
//! - an updated [`RunState`]
//! - a list of [`CoreCommand`](crate::engine::CoreCommand)s describing what
//!   the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) owns the timers, channels and
//! the executor. The core is unit tested without Tokio, processes or a
//! filesystem.

use std::time::Instant;

use crate::engine::event_handlers::{
    CoreStep, handle_deadline, handle_files_changed, handle_run_finished, handle_shutdown,
    handle_start,
};
use crate::engine::state::RunState;
use crate::engine::{LoopPhase, LoopReport, RunId, RuntimeEvent, RuntimeOptions};

#[derive(Debug)]
pub struct CoreRuntime {
    state: RunState,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            state: RunState::new(options.debounce),
            options,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.state.phase()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.state.active_run()
    }

    /// When the IO shell should call [`CoreRuntime::on_deadline`] next.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.next_deadline()
    }

    /// Kick off the loop: the initial run, unless disabled.
    pub fn start(&mut self) -> CoreStep {
        handle_start(&mut self.state, &self.options)
    }

    /// Handle a single runtime event, updating state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent, now: Instant) -> CoreStep {
        match event {
            RuntimeEvent::FilesChanged { paths } => {
                handle_files_changed(&mut self.state, &self.options, paths, now)
            }
            RuntimeEvent::RunFinished { run_id, outcome } => {
                handle_run_finished(&mut self.state, &self.options, run_id, outcome)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&mut self.state),
        }
    }

    /// The debounce timer fired (or the shell polled late).
    pub fn on_deadline(&mut self, now: Instant) -> CoreStep {
        handle_deadline(&mut self.state, now)
    }

    /// The shell has released every OS handle.
    pub fn mark_stopped(&mut self) {
        self.state.mark_stopped();
    }

    pub fn report(&self) -> LoopReport {
        self.state.report(self.options.exit_when_idle)
    }
}
