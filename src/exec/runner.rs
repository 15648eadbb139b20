// src/exec/runner.rs

//! Supervision of a single command process.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::engine::{RunId, RunOutcome, RuntimeEvent};
use crate::types::{StreamKind, TerminatedOutput};

use super::SupervisorOptions;
use super::signal;
use super::sink::{OutputSink, RunReport};

/// How long the output readers get to drain the pipes once the process is
/// gone. A grandchild that inherited a pipe can keep it open indefinitely.
/// After a termination request the drain also has to fit in what is left of
/// `kill_timeout`.
pub(crate) const FLUSH_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8 * 1024;

/// Everything a supervisor task needs besides the child itself.
pub(crate) struct RunContext {
    pub run_id: RunId,
    pub sink: Arc<dyn OutputSink>,
    pub runtime_tx: mpsc::Sender<RuntimeEvent>,
    pub options: SupervisorOptions,
    pub started: Instant,
}

/// Supervise a spawned child until it exits or is cancelled.
///
/// - On a normal exit the output is drained, the report goes to the sink and
///   a `RunFinished` event is sent to the runtime.
/// - If the cancel channel fires (or its sender is dropped) the child is
///   terminated (SIGTERM, then SIGKILL after `kill_timeout`) and **no**
///   `RunFinished` event is sent: the core has already moved past this run.
///   With `TerminatedOutput::Discard` the readers are stopped before the
///   signal goes out; with `Flush` the drain counts against `kill_timeout`.
pub(crate) async fn supervise(
    mut child: Child,
    ctx: RunContext,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let run_id = ctx.run_id;
    let pumps = OutputPumps::attach(&mut child, run_id, &ctx.sink);

    tokio::select! {
        status_res = child.wait() => {
            let outcome = match status_res {
                Ok(status) => RunOutcome::Exited {
                    code: status.code(),
                    success: status.success(),
                },
                Err(err) => {
                    error!(run_id, error = %err, "failed waiting for command process");
                    RunOutcome::Exited { code: None, success: false }
                }
            };

            info!(run_id, ?outcome, "command process exited");

            pumps.flush(FLUSH_GRACE).await;
            ctx.sink.run_finished(&RunReport {
                run_id,
                outcome: outcome.clone(),
                elapsed: ctx.started.elapsed(),
            });

            if let Err(err) = ctx
                .runtime_tx
                .send(RuntimeEvent::RunFinished { run_id, outcome })
                .await
            {
                debug!(run_id, error = %err, "runtime gone; dropping RunFinished");
            }
        }

        cancel = &mut cancel_rx => {
            if cancel.is_err() {
                debug!(run_id, "executor dropped; terminating orphaned run");
            } else {
                info!(run_id, "termination requested for running command");
            }

            let kill_timeout = ctx.options.kill_timeout;
            let forced = match ctx.options.terminated_output {
                TerminatedOutput::Discard => {
                    // Readers go first so nothing printed by a TERM handler
                    // reaches the sink.
                    pumps.discard().await;
                    terminate_child(&mut child, kill_timeout, run_id).await
                }
                TerminatedOutput::Flush => {
                    let budget_end = Instant::now() + kill_timeout;
                    let forced = terminate_child(&mut child, kill_timeout, run_id).await;
                    let left = budget_end.saturating_duration_since(Instant::now());
                    pumps.flush(left.min(FLUSH_GRACE)).await;
                    forced
                }
            };

            ctx.sink.run_finished(&RunReport {
                run_id,
                outcome: RunOutcome::Terminated { forced },
                elapsed: ctx.started.elapsed(),
            });
        }
    }
}

/// SIGTERM the child's group, wait up to `grace`, then SIGKILL and reap.
///
/// Returns `true` when the kill had to be forced.
pub(crate) async fn terminate_child(child: &mut Child, grace: Duration, run_id: RunId) -> bool {
    if let Err(err) = signal::request_termination(child) {
        warn!(run_id, error = %err, "failed to send termination signal");
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            debug!(run_id, %status, "command exited after termination request");
            false
        }
        Ok(Err(err)) => {
            warn!(run_id, error = %err, "failed waiting for terminated command; killing it");
            signal::force_kill(child).await;
            true
        }
        Err(_) => {
            warn!(run_id, ?grace, "command ignored termination request; killing it");
            signal::force_kill(child).await;
            true
        }
    }
}

/// Reader tasks forwarding the child's stdout/stderr to the sink.
struct OutputPumps {
    handles: Vec<JoinHandle<()>>,
}

impl OutputPumps {
    fn attach(child: &mut Child, run_id: RunId, sink: &Arc<dyn OutputSink>) -> Self {
        let mut handles = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            handles.push(tokio::spawn(pump(
                stdout,
                run_id,
                StreamKind::Stdout,
                Arc::clone(sink),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            handles.push(tokio::spawn(pump(
                stderr,
                run_id,
                StreamKind::Stderr,
                Arc::clone(sink),
            )));
        }
        Self { handles }
    }

    /// Wait for both pipes to reach EOF, up to `grace` in total.
    async fn flush(self, grace: Duration) {
        let deadline = Instant::now() + grace;
        for mut handle in self.handles {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                debug!("output pipe still open after grace period; detaching reader");
                handle.abort();
            }
        }
    }

    /// Stop the readers and wait until they are gone, so no further output
    /// reaches the sink once this returns.
    async fn discard(self) {
        for handle in &self.handles {
            handle.abort();
        }
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn pump<R>(mut reader: R, run_id: RunId, stream: StreamKind, sink: Arc<dyn OutputSink>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => sink.output(run_id, stream, &buf[..n]),
            Err(err) => {
                debug!(run_id, ?stream, error = %err, "error reading command output");
                break;
            }
        }
    }
}
