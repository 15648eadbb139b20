// src/watch/event_handler.rs

//! Turning raw `notify` events into runtime events.

use std::path::PathBuf;

use notify::{Event, EventKind};
use tracing::{debug, trace};

use crate::watch::patterns::WatchMatcher;

/// Decide whether a notify event should reach the runtime, and with which
/// paths.
///
/// - Pure access events (open/read/close) never count as a change.
/// - Paths filtered out by the matcher (excludes, outside targets) are
///   dropped; if nothing is left the event is ignored.
/// - An event without paths (e.g. a rescan request from the backend) is
///   passed through, since something under the watch may have changed.
pub fn relevant_paths(event: &Event, matcher: &WatchMatcher) -> Option<Vec<PathBuf>> {
    if matches!(event.kind, EventKind::Access(_)) {
        trace!(kind = ?event.kind, "ignoring access event");
        return None;
    }

    if event.paths.is_empty() {
        debug!(kind = ?event.kind, "event without paths; treating as a change");
        return Some(Vec::new());
    }

    let paths: Vec<PathBuf> = event
        .paths
        .iter()
        .filter(|p| matcher.is_relevant(p))
        .cloned()
        .collect();

    if paths.is_empty() {
        debug!(paths = ?event.paths, "no relevant paths in event");
        None
    } else {
        Some(paths)
    }
}
