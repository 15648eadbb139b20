// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production supervisor in [`runner`](super::runner).
//!
//! - `RealExecutorBackend` is the implementation used by `watch-run`. It owns
//!   the single live child (through its supervisor task) and terminates it
//!   before anything new is started.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which runs were started and emits `RunFinished` events on demand.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::engine::{RunId, RunOutcome, RuntimeEvent, ScheduledRun};
use crate::errors::Result;

use super::SupervisorOptions;
use super::command::CommandSpec;
use super::runner::{RunContext, supervise};
use super::sink::OutputSink;

/// Extra time allowed for the supervisor task on top of the kill timeout,
/// which already covers the output flush. Leaves room to reap after SIGKILL.
const REAP_SLACK: Duration = Duration::from_millis(500);

/// Result of asking the executor to start a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartResult {
    /// The process is running; a `RunFinished` event follows when it exits
    /// on its own.
    Spawned { pid: Option<u32> },
    /// The run ended before it began (e.g. the binary does not exist). No
    /// event will follow; the caller reports this outcome itself.
    Finished(RunOutcome),
}

/// Trait abstracting how runs are executed.
///
/// Implementations must uphold mutual exclusion: when `start_run` returns,
/// any previous run has been terminated and reaped.
pub trait ExecutorBackend: Send {
    /// Terminate whatever is still running, then start `run`.
    fn start_run(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<StartResult>> + Send + '_>>;

    /// Terminate the running command, if any. Idempotent.
    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

struct ActiveRun {
    run_id: RunId,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    command: CommandSpec,
    options: SupervisorOptions,
    sink: Arc<dyn OutputSink>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    active: Option<ActiveRun>,
}

impl fmt::Debug for RealExecutorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealExecutorBackend")
            .field("command", &self.command)
            .field("options", &self.options)
            .field("active_run", &self.active.as_ref().map(|a| a.run_id))
            .finish_non_exhaustive()
    }
}

impl RealExecutorBackend {
    pub fn new(
        command: CommandSpec,
        options: SupervisorOptions,
        sink: Arc<dyn OutputSink>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            command,
            options,
            sink,
            runtime_tx,
            active: None,
        }
    }

    /// Whether a supervised process is currently alive.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Cancel the active run and wait for its supervisor to finish.
    ///
    /// The supervisor itself bounds termination and the output flush by
    /// `kill_timeout`; the outer timeout only guards against a wedged task.
    async fn terminate_active(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        if active.handle.is_finished() {
            return;
        }

        info!(run_id = active.run_id, "terminating running command");
        if let Some(cancel) = active.cancel.take() {
            // Err means the supervisor is already past its select.
            let _ = cancel.send(());
        }

        let bound = self.options.kill_timeout + REAP_SLACK;
        if tokio::time::timeout(bound, &mut active.handle).await.is_err() {
            warn!(
                run_id = active.run_id,
                ?bound,
                "supervisor did not finish in time; aborting it"
            );
            active.handle.abort();
        }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn start_run(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<StartResult>> + Send + '_>> {
        Box::pin(async move {
            self.terminate_active().await;

            let run_id = run.run_id;
            let child = match self.command.spawn() {
                Ok(child) => child,
                Err(err) => {
                    error!(run_id, cmd = %self.command, error = %err, "failed to start command");
                    self.sink.spawn_failed(run_id, &err);
                    return Ok(StartResult::Finished(RunOutcome::SpawnFailed(
                        err.to_string(),
                    )));
                }
            };

            let pid = child.id();
            info!(run_id, ?pid, cmd = %self.command, "command started");
            self.sink.run_started(&run, &self.command);

            let (cancel_tx, cancel_rx) = oneshot::channel();
            let ctx = RunContext {
                run_id,
                sink: Arc::clone(&self.sink),
                runtime_tx: self.runtime_tx.clone(),
                options: self.options,
                started: tokio::time::Instant::now(),
            };
            let handle = tokio::spawn(supervise(child, ctx, cancel_rx));

            self.active = Some(ActiveRun {
                run_id,
                cancel: Some(cancel_tx),
                handle,
            });
            Ok(StartResult::Spawned { pid })
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.terminate_active().await;
            Ok(())
        })
    }
}
