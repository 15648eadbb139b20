// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::{ExecutorBackend, StartResult};

use super::core::CoreRuntime;
use super::stop::StopHandle;
use super::{CoreCommand, CoreStep, LoopReport, RuntimeEvent};

/// What woke the loop up.
enum Wake {
    Stop,
    Event(Option<RuntimeEvent>),
    Deadline,
}

/// Drives [`CoreRuntime`] in response to `RuntimeEvent`s and timer expiry,
/// and delegates process handling to an `ExecutorBackend`.
///
/// The loop is single-threaded and cooperative: it waits on exactly three
/// things (stop request, next event, debounce deadline) and performs one
/// action at a time. While the executor is terminating a superseded run the
/// loop is blocked; events queue up in the channel and are handled in arrival
/// order afterwards.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    stop: StopHandle,
    /// Events produced by our own commands (e.g. a spawn failure), handled
    /// before anything new is read from the channel.
    backlog: VecDeque<RuntimeEvent>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("backlog", &self.backlog)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
        stop: StopHandle,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            stop,
            backlog: VecDeque::new(),
        }
    }

    /// Run the loop until a stop request, `--once` completion, or the event
    /// channel closing.
    ///
    /// Whatever way the loop ends (including an error), the executor is shut
    /// down before this returns, so no child outlives the loop.
    pub async fn run(mut self) -> Result<LoopReport> {
        info!("watch-run loop started");

        let result = self.event_loop().await;

        if let Err(err) = self.executor.shutdown().await {
            warn!(error = %err, "failed to release the running command cleanly");
        }
        self.core.mark_stopped();
        info!("watch-run loop stopped");

        result.map(|()| self.core.report())
    }

    async fn event_loop(&mut self) -> Result<()> {
        if self.stop.is_stopped() {
            info!("stop requested before start; not running anything");
            return Ok(());
        }

        let step = self.core.start();
        if !self.apply(step).await? {
            return Ok(());
        }

        loop {
            let step = match self.backlog.pop_front() {
                Some(event) => self.core.step(event, now()),
                None => self.wait_for_next_step().await,
            };

            if !self.apply(step).await? {
                info!("core requested exit; stopping runtime");
                break;
            }
        }
        Ok(())
    }

    async fn wait_for_next_step(&mut self) -> CoreStep {
        let deadline = self.core.next_deadline();

        let wake = tokio::select! {
            biased;
            _ = self.stop.stopped() => Wake::Stop,
            event = self.event_rx.recv() => Wake::Event(event),
            _ = sleep_until(deadline) => Wake::Deadline,
        };

        match wake {
            Wake::Stop => self.core.step(RuntimeEvent::ShutdownRequested, now()),
            Wake::Event(Some(event)) => {
                debug!(?event, "runtime received event");
                self.core.step(event, now())
            }
            Wake::Event(None) => {
                info!("runtime event channel closed; shutting down");
                self.core.step(RuntimeEvent::ShutdownRequested, now())
            }
            Wake::Deadline => self.core.on_deadline(now()),
        }
    }

    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        Ok(step.keep_running)
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::StartRun(run) => {
                let run_id = run.run_id;
                debug!(run_id, reason = ?run.reason, "dispatching run to executor");
                if let StartResult::Finished(outcome) = self.executor.start_run(run).await? {
                    self.backlog
                        .push_back(RuntimeEvent::RunFinished { run_id, outcome });
                }
            }
            CoreCommand::StopRunning => {
                self.executor.shutdown().await?;
            }
        }
        Ok(())
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending::<()>().await,
    }
}
