// src/watch/debounce.rs

//! Trailing-edge debouncer.
//!
//! Every recorded change pushes the deadline to `now + window`, so a burst of
//! changes fires once, one full window after the *last* change. The debouncer
//! is pure: callers pass the current instant in, which keeps it testable
//! without timers.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// A coalesced burst of changes, ready to trigger a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trigger {
    /// Distinct changed paths, in order of first appearance.
    pub paths: Vec<PathBuf>,
    /// Number of filesystem events folded into this trigger.
    pub events: usize,
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    pending: Trigger,
    /// Membership index for `pending.paths`.
    seen: HashSet<PathBuf>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            pending: Trigger::default(),
            seen: HashSet::new(),
        }
    }

    /// Record one filesystem event observed at `now`.
    pub fn record<I>(&mut self, paths: I, now: Instant)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for path in paths {
            if self.seen.insert(path.clone()) {
                self.pending.paths.push(path);
            }
        }
        self.pending.events += 1;
        self.deadline = Some(now + self.window);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// If the quiet period has elapsed at `now`, hand out the coalesced
    /// trigger and reset.
    pub fn take_due(&mut self, now: Instant) -> Option<Trigger> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.seen.clear();
                Some(std::mem::take(&mut self.pending))
            }
            _ => None,
        }
    }

    /// Drop anything pending (used on shutdown).
    pub fn clear(&mut self) {
        self.deadline = None;
        self.pending = Trigger::default();
        self.seen.clear();
    }
}
