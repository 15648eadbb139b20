#![allow(dead_code)]

pub use watch_run_test_utils::{init_tracing, with_timeout};

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use watch_run::engine::{CoreRuntime, LoopReport, Runtime, RuntimeEvent, RuntimeOptions, StopHandle};
use watch_run::errors::Result;
use watch_run_test_utils::fake_executor::{FakeExecutor, FakeMode, FakeTracker};

/// A `Runtime` driven by a `FakeExecutor`, running on its own task.
pub struct FakeHarness {
    pub tx: mpsc::Sender<RuntimeEvent>,
    pub tracker: FakeTracker,
    pub stop: StopHandle,
    pub handle: JoinHandle<Result<LoopReport>>,
}

impl FakeHarness {
    pub fn spawn(options: RuntimeOptions, mode: FakeMode) -> Self {
        let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
        let (executor, tracker) = FakeExecutor::new(tx.clone(), mode);
        let stop = StopHandle::new();
        let runtime = Runtime::new(CoreRuntime::new(options), rx, executor, stop.clone());
        let handle = tokio::spawn(runtime.run());
        Self {
            tx,
            tracker,
            stop,
            handle,
        }
    }

    pub async fn touch(&self, path: &str) {
        self.tx
            .send(RuntimeEvent::FilesChanged {
                paths: vec![PathBuf::from(path)],
            })
            .await
            .expect("runtime channel closed");
    }

    /// Stop the loop and return its report.
    pub async fn shutdown(self) -> LoopReport {
        self.stop.stop();
        self.handle
            .await
            .expect("runtime task panicked")
            .expect("runtime returned an error")
    }
}

pub fn options(debounce_ms: u64, initial_run: bool) -> RuntimeOptions {
    RuntimeOptions {
        debounce: Duration::from_millis(debounce_ms),
        initial_run,
        exit_when_idle: false,
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Poll `cond` every 20ms until it holds, or panic after `limit`.
pub async fn wait_until(limit: Duration, what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + limit;
    while !cond() {
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
