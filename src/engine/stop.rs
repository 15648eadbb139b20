// src/engine/stop.rs

//! Stop requests.
//!
//! [`StopHandle::stop`] flips an atomic flag and wakes the loop. It does not
//! wait for the teardown and can be called any number of times from any
//! thread or task. The loop does the actual teardown (terminate the child,
//! drop the watcher).
//!
//! Waking goes through `tokio::sync::Notify`, which takes a short internal
//! lock, so `stop` is not async-signal-safe. OS signals never call it from a
//! raw handler: [`spawn_signal_listener`] receives them via `tokio::signal`
//! and calls `stop` from an ordinary task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct StopState {
    requested: AtomicBool,
    notify: Notify,
}

/// Cloneable handle used to ask the watch-run loop to shut down.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    inner: Arc<StopState>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Idempotent; returns without waiting for the loop.
    pub fn stop(&self) {
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolves once [`StopHandle::stop`] has been called (immediately if it
    /// already was).
    pub async fn stopped(&self) {
        loop {
            // Register before checking the flag so a concurrent `stop` cannot
            // slip between the check and the await.
            let notified = self.inner.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// Translate Ctrl-C (and SIGTERM on unix) into a stop request.
pub fn spawn_signal_listener(stop: StopHandle) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("interrupt received; shutting down");
        stop.stop();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(err) => {
            warn!(error = %err, "failed to listen for SIGTERM; only Ctrl-C will stop the loop");
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
