// tests/core_properties.rs

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use watch_run::engine::{
    CoreCommand, CoreRuntime, CoreStep, RunId, RunOutcome, RuntimeEvent, RuntimeOptions,
};

const WINDOW_MS: u64 = 200;

#[derive(Debug, Clone)]
enum Action {
    /// Change to file `n` after waiting `gap` ms.
    Touch { gap: u64, file: u8 },
    /// The live run (if any) exits after waiting `gap` ms.
    Exit { gap: u64 },
    /// A stale completion for an old run id.
    StaleExit { back: u64 },
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (0..400u64, 0..5u8).prop_map(|(gap, file)| Action::Touch { gap, file }),
        1 => (0..400u64).prop_map(|gap| Action::Exit { gap }),
        1 => (1..4u64).prop_map(|back| Action::StaleExit { back }),
    ]
}

/// Replays core commands the way a correct executor would: starting a run
/// replaces the live one.
#[derive(Default)]
struct Model {
    live: Option<RunId>,
    started: Vec<RunId>,
    /// Starts issued while the core still considered another run active.
    overlapping_starts: usize,
}

impl Model {
    fn apply(&mut self, step: CoreStep) {
        for command in step.commands {
            match command {
                CoreCommand::StartRun(run) => {
                    if self.live.is_some_and(|live| live >= run.run_id) {
                        self.overlapping_starts += 1;
                    }
                    self.live = Some(run.run_id);
                    self.started.push(run.run_id);
                }
                CoreCommand::StopRunning => self.live = None,
            }
        }
    }
}

/// Fire every deadline that is due at or before `until`.
fn advance(core: &mut CoreRuntime, model: &mut Model, now: &mut Instant, until: Instant) {
    while let Some(deadline) = core.next_deadline() {
        if deadline > until {
            break;
        }
        *now = deadline;
        model.apply(core.on_deadline(deadline));
    }
    *now = until;
}

fn opts() -> RuntimeOptions {
    RuntimeOptions {
        debounce: Duration::from_millis(WINDOW_MS),
        initial_run: false,
        exit_when_idle: false,
    }
}

proptest! {
    /// Any burst of changes spaced closer than the window triggers exactly
    /// one run, one window after the last change.
    #[test]
    fn burst_within_window_runs_once(gaps in proptest::collection::vec(0..WINDOW_MS, 1..20)) {
        let t0 = Instant::now();
        let mut core = CoreRuntime::new(opts());
        let mut model = Model::default();
        model.apply(core.start());

        let mut now = t0;
        let mut touched = BTreeSet::new();
        for (i, gap) in gaps.iter().enumerate() {
            let next = now + Duration::from_millis(*gap);
            advance(&mut core, &mut model, &mut now, next);
            let path = PathBuf::from(format!("/p/src/{}.rs", i % 3));
            touched.insert(path.clone());
            model.apply(core.step(RuntimeEvent::FilesChanged { paths: vec![path] }, now));
        }
        let last = now;

        prop_assert!(model.started.is_empty());
        prop_assert_eq!(core.next_deadline(), Some(last + Duration::from_millis(WINDOW_MS)));

        let end = last + Duration::from_secs(10);
        advance(&mut core, &mut model, &mut now, end);
        prop_assert_eq!(model.started.len(), 1);
        prop_assert_eq!(core.active_run(), Some(1));
    }

    /// Whatever the interleaving, at most one run is live, run ids increase,
    /// and the core only ever tracks the newest run.
    #[test]
    fn at_most_one_live_run(actions in proptest::collection::vec(action(), 1..60)) {
        let t0 = Instant::now();
        let mut core = CoreRuntime::new(opts());
        let mut model = Model::default();
        model.apply(core.start());
        let mut now = t0;

        for action in actions {
            match action {
                Action::Touch { gap, file } => {
                    let next = now + Duration::from_millis(gap);
                    advance(&mut core, &mut model, &mut now, next);
                    let path = PathBuf::from(format!("/p/src/{file}.rs"));
                    model.apply(core.step(RuntimeEvent::FilesChanged { paths: vec![path] }, now));
                }
                Action::Exit { gap } => {
                    let next = now + Duration::from_millis(gap);
                    advance(&mut core, &mut model, &mut now, next);
                    if let Some(run_id) = model.live.take() {
                        let outcome = RunOutcome::Exited { code: Some(0), success: true };
                        model.apply(core.step(RuntimeEvent::RunFinished { run_id, outcome }, now));
                    }
                }
                Action::StaleExit { back } => {
                    let Some(live) = core.active_run() else { continue };
                    let Some(stale) = live.checked_sub(back).filter(|id| *id > 0) else { continue };
                    let before = core.active_run();
                    let outcome = RunOutcome::Exited { code: Some(1), success: false };
                    model.apply(core.step(RuntimeEvent::RunFinished { run_id: stale, outcome }, now));
                    prop_assert_eq!(core.active_run(), before);
                }
            }
            prop_assert_eq!(model.overlapping_starts, 0);
            prop_assert_eq!(core.active_run(), model.live);
        }

        let ids = model.started.clone();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(core.report().runs_started, ids.len() as u64);
    }
}
