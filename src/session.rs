// src/session.rs

//! A running watch-run loop and everything it owns.

use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::WatchRunConfig;
use crate::engine::{CoreRuntime, LoopReport, Runtime, RuntimeEvent, StopHandle};
use crate::errors::Result;
use crate::exec::{OutputSink, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{WatcherHandle, spawn_watcher};

/// Capacity of the runtime event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A started loop: the runtime task, the file watcher and the stop handle.
///
/// Dropping a `Session` requests a stop; the runtime then terminates the
/// running command on its own. Use [`Session::wait`] to block until that
/// teardown has finished.
#[derive(Debug)]
pub struct Session {
    stop: StopHandle,
    runtime: Option<JoinHandle<Result<LoopReport>>>,
    watcher: Option<WatcherHandle>,
}

impl Session {
    /// Start watching (unless the config asks for a single run) and launch
    /// the loop. Must be called from inside a tokio runtime.
    ///
    /// Fails with `ConfigError` when none of the watch paths exist, or with
    /// `WatchError` when the OS watcher cannot be set up. Nothing is left
    /// running in either case.
    pub fn start(config: WatchRunConfig, root: &Path, sink: Arc<dyn OutputSink>) -> Result<Self> {
        Self::start_with_fs(config, root, sink, &RealFileSystem)
    }

    pub fn start_with_fs(
        config: WatchRunConfig,
        root: &Path,
        sink: Arc<dyn OutputSink>,
        fs: &dyn FileSystem,
    ) -> Result<Self> {
        let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);

        let watcher = if config.runtime.exit_when_idle {
            debug!("single run requested; not watching");
            None
        } else {
            let matcher = config.watch.resolve(fs, root)?;
            Some(spawn_watcher(matcher, rt_tx.clone())?)
        };

        let executor = RealExecutorBackend::new(config.command, config.supervisor, sink, rt_tx);
        let core = CoreRuntime::new(config.runtime);
        let stop = StopHandle::new();
        let runtime = Runtime::new(core, rt_rx, executor, stop.clone());

        info!(
            debounce = ?config.runtime.debounce,
            kill_timeout = ?config.supervisor.kill_timeout,
            "session started"
        );

        Ok(Self {
            stop,
            runtime: Some(tokio::spawn(runtime.run())),
            watcher,
        })
    }

    /// Request shutdown. Idempotent and non-blocking.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Wait for the loop to end (stop request or `--once` completion) and
    /// release the watcher.
    pub async fn wait(mut self) -> Result<LoopReport> {
        let Some(runtime) = self.runtime.take() else {
            return Err(anyhow!("session already finished").into());
        };

        let result = runtime
            .await
            .map_err(|err| anyhow!("runtime task failed: {err}"))?;

        if let Some(watcher) = self.watcher.take() {
            watcher.stop();
        }
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop.stop();
    }
}
