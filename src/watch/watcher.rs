// src/watch/watcher.rs

use std::path::PathBuf;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::watch::event_handler::relevant_paths;
use crate::watch::patterns::WatchMatcher;

/// Handle for the filesystem watcher.
///
/// Owns the underlying `RecommendedWatcher` and the task forwarding its
/// events. Dropping the handle stops file watching and releases the OS
/// handles.
pub struct WatcherHandle {
    watcher: Option<RecommendedWatcher>,
    forwarder: JoinHandle<()>,
    dirs: Vec<PathBuf>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("dirs", &self.dirs)
            .finish_non_exhaustive()
    }
}

impl WatcherHandle {
    /// Stop watching now instead of at drop time.
    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.watcher.take().is_some() {
            info!("file watcher stopped");
        }
        self.forwarder.abort();
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Spawn a filesystem watcher over every target of `matcher` and forward
/// relevant changes as `RuntimeEvent::FilesChanged` into `runtime_tx`.
///
/// Directory entries are watched recursively; file entries through their
/// parent directory, non-recursively. Failing to watch any directory is
/// fatal: the caller gets the error and nothing keeps running.
pub fn spawn_watcher(
    matcher: WatchMatcher,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watch event dropped; forwarder has stopped");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    let mut watched = Vec::new();
    for (dir, recursive) in matcher.watch_dirs() {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&dir, mode)?;
        watched.push(dir);
    }

    info!(dirs = ?watched, "file watcher started");

    let forwarder = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            let Some(paths) = relevant_paths(&event, &matcher) else {
                continue;
            };

            if let Err(err) = runtime_tx.send(RuntimeEvent::FilesChanged { paths }).await {
                // The runtime is gone; no point keeping the forwarder alive.
                debug!("runtime channel closed, stopping watch forwarder: {err}");
                break;
            }
        }
        debug!("watch forwarder finished");
    });

    Ok(WatcherHandle {
        watcher: Some(watcher),
        forwarder,
        dirs: watched,
    })
}
