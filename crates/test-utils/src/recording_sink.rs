use std::sync::Mutex;

use watch_run::engine::{RunId, ScheduledRun};
use watch_run::errors::WatchRunError;
use watch_run::exec::{CommandSpec, OutputSink, RunReport};
use watch_run::types::StreamKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Started(RunId),
    Output(RunId, StreamKind, Vec<u8>),
    Finished(RunReport),
    SpawnFailed(RunId, String),
}

/// `OutputSink` that keeps everything it is given, for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Concatenated output of one run on one stream.
    pub fn output_of(&self, run_id: RunId, stream: StreamKind) -> String {
        let bytes: Vec<u8> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Output(id, s, chunk) if id == run_id && s == stream => Some(chunk),
                _ => None,
            })
            .flatten()
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn reports(&self) -> Vec<RunReport> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Finished(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    pub fn report_for(&self, run_id: RunId) -> Option<RunReport> {
        self.reports().into_iter().find(|r| r.run_id == run_id)
    }

    pub fn spawn_failures(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SinkEvent::SpawnFailed(..)))
            .count()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl OutputSink for RecordingSink {
    fn run_started(&self, run: &ScheduledRun, _command: &CommandSpec) {
        self.push(SinkEvent::Started(run.run_id));
    }

    fn output(&self, run_id: RunId, stream: StreamKind, chunk: &[u8]) {
        self.push(SinkEvent::Output(run_id, stream, chunk.to_vec()));
    }

    fn run_finished(&self, report: &RunReport) {
        self.push(SinkEvent::Finished(report.clone()));
    }

    fn spawn_failed(&self, run_id: RunId, error: &WatchRunError) {
        self.push(SinkEvent::SpawnFailed(run_id, error.to_string()));
    }
}
