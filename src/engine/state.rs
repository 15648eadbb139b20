// src/engine/state.rs

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::engine::{LoopPhase, LoopReport, RunId, RunOutcome, ScheduledRun, TriggerReason};
use crate::watch::{Debouncer, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Watching,
    ShuttingDown,
    Stopped,
}

/// Everything the loop mutates: the debounce timer and the (single) active
/// run. Owned by [`CoreRuntime`](crate::engine::CoreRuntime); nothing else
/// holds a reference, so no locking is involved.
#[derive(Debug)]
pub struct RunState {
    debouncer: Debouncer,
    active: Option<RunId>,
    next_run_id: RunId,
    runs_started: u64,
    last_outcome: Option<RunOutcome>,
    lifecycle: Lifecycle,
}

impl RunState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(debounce),
            active: None,
            next_run_id: 1,
            runs_started: 0,
            last_outcome: None,
            lifecycle: Lifecycle::Watching,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        match self.lifecycle {
            Lifecycle::Stopped => LoopPhase::Stopped,
            Lifecycle::ShuttingDown => LoopPhase::ShuttingDown,
            Lifecycle::Watching if self.debouncer.is_pending() => LoopPhase::Debouncing,
            Lifecycle::Watching if self.active.is_some() => LoopPhase::Running,
            Lifecycle::Watching => LoopPhase::Idle,
        }
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lifecycle != Lifecycle::Watching
    }

    pub fn has_pending_trigger(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn record_change(&mut self, paths: Vec<PathBuf>, now: Instant) {
        self.debouncer.record(paths, now);
    }

    pub fn take_due(&mut self, now: Instant) -> Option<Trigger> {
        self.debouncer.take_due(now)
    }

    /// Allocate a run id and make it the active run. Any previous run is
    /// superseded; the executor terminates it before starting this one.
    pub fn begin_run(&mut self, reason: TriggerReason, trigger: Trigger) -> ScheduledRun {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.runs_started += 1;
        self.active = Some(run_id);
        ScheduledRun {
            run_id,
            reason,
            changed: trigger.paths,
            events: trigger.events,
        }
    }

    /// Record the end of a run. Returns `false` for a run that was already
    /// superseded; its outcome is ignored.
    pub fn finish_run(&mut self, run_id: RunId, outcome: RunOutcome) -> bool {
        if self.active != Some(run_id) {
            return false;
        }
        self.active = None;
        self.last_outcome = Some(outcome);
        true
    }

    pub fn begin_shutdown(&mut self) {
        if self.lifecycle == Lifecycle::Watching {
            self.lifecycle = Lifecycle::ShuttingDown;
        }
        self.debouncer.clear();
    }

    /// The executor has released the child; nothing is alive any more.
    pub fn mark_stopped(&mut self) {
        self.debouncer.clear();
        self.active = None;
        self.lifecycle = Lifecycle::Stopped;
    }

    pub fn report(&self, once: bool) -> LoopReport {
        LoopReport {
            runs_started: self.runs_started,
            last_outcome: self.last_outcome.clone(),
            once,
        }
    }
}
