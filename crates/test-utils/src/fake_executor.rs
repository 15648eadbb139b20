use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::time::Instant;
use watch_run::engine::{RunId, RunOutcome, RuntimeEvent, ScheduledRun};
use watch_run::errors::Result;
use watch_run::exec::{ExecutorBackend, StartResult};

/// How the fake behaves when asked to start a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeMode {
    /// The run stays "alive" until the test calls [`FakeTracker::finish`] or a
    /// newer run supersedes it.
    Hold,
    /// The run finishes immediately with the given outcome.
    Complete(RunOutcome),
    /// The binary is "missing": every start fails to spawn.
    FailSpawn,
}

/// One `start_run` call as seen by the fake.
#[derive(Debug, Clone)]
pub struct StartRecord {
    pub run: ScheduledRun,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct FakeLog {
    starts: Vec<StartRecord>,
    live: Option<RunId>,
    terminated: Vec<RunId>,
    shutdowns: usize,
    max_live: usize,
}

/// A fake executor that:
/// - records which runs were started, and when (tokio time, so paused-clock
///   tests see exact instants)
/// - keeps track of the single "live" run, terminating it when superseded
/// - reports completion according to its [`FakeMode`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mode: FakeMode,
    log: Arc<Mutex<FakeLog>>,
}

/// Test-side view of a [`FakeExecutor`], usable after the executor has been
/// moved into the runtime.
#[derive(Clone)]
pub struct FakeTracker {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    log: Arc<Mutex<FakeLog>>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, mode: FakeMode) -> (Self, FakeTracker) {
        let log = Arc::new(Mutex::new(FakeLog::default()));
        let tracker = FakeTracker {
            runtime_tx: runtime_tx.clone(),
            log: Arc::clone(&log),
        };
        (
            Self {
                runtime_tx,
                mode,
                log,
            },
            tracker,
        )
    }
}

fn lock(log: &Mutex<FakeLog>) -> MutexGuard<'_, FakeLog> {
    log.lock().expect("fake executor log poisoned")
}

impl ExecutorBackend for FakeExecutor {
    fn start_run(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<StartResult>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let mode = self.mode.clone();
        let log = Arc::clone(&self.log);

        Box::pin(async move {
            let run_id = run.run_id;
            {
                let mut guard = lock(&log);
                if let Some(previous) = guard.live.take() {
                    guard.terminated.push(previous);
                }
                guard.starts.push(StartRecord {
                    run,
                    at: Instant::now(),
                });
            }

            match mode {
                FakeMode::FailSpawn => Ok(StartResult::Finished(RunOutcome::SpawnFailed(
                    "No such file or directory".to_string(),
                ))),
                FakeMode::Hold => {
                    let mut guard = lock(&log);
                    guard.live = Some(run_id);
                    guard.max_live = guard.max_live.max(1);
                    Ok(StartResult::Spawned { pid: None })
                }
                FakeMode::Complete(outcome) => {
                    lock(&log).max_live = 1;
                    tx.send(RuntimeEvent::RunFinished { run_id, outcome })
                        .await
                        .map_err(anyhow::Error::from)?;
                    Ok(StartResult::Spawned { pid: None })
                }
            }
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let log = Arc::clone(&self.log);
        Box::pin(async move {
            let mut guard = lock(&log);
            guard.shutdowns += 1;
            if let Some(previous) = guard.live.take() {
                guard.terminated.push(previous);
            }
            Ok(())
        })
    }
}

impl FakeTracker {
    /// Ids of all started runs, in order.
    pub fn started(&self) -> Vec<RunId> {
        lock(&self.log).starts.iter().map(|s| s.run.run_id).collect()
    }

    pub fn starts(&self) -> Vec<StartRecord> {
        lock(&self.log).starts.clone()
    }

    pub fn start_count(&self) -> usize {
        lock(&self.log).starts.len()
    }

    /// Runs that were terminated by a newer run or by shutdown.
    pub fn terminated(&self) -> Vec<RunId> {
        lock(&self.log).terminated.clone()
    }

    pub fn live(&self) -> Option<RunId> {
        lock(&self.log).live
    }

    pub fn max_live(&self) -> usize {
        lock(&self.log).max_live
    }

    pub fn shutdowns(&self) -> usize {
        lock(&self.log).shutdowns
    }

    /// Let the live run exit on its own with `outcome`.
    pub async fn finish(&self, outcome: RunOutcome) {
        let run_id = lock(&self.log)
            .live
            .take()
            .expect("finish() called with no live run");
        self.runtime_tx
            .send(RuntimeEvent::RunFinished { run_id, outcome })
            .await
            .expect("runtime channel closed");
    }
}
