// tests/core_state_machine.rs

use std::path::PathBuf;
use std::time::{Duration, Instant};

use watch_run::engine::{
    CoreCommand, CoreRuntime, CoreStep, LoopPhase, LoopReport, RunOutcome, RunState,
    RuntimeEvent, RuntimeOptions, ScheduledRun, TriggerReason,
};
use watch_run::watch::Trigger;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn watching() -> RuntimeOptions {
    RuntimeOptions {
        debounce: ms(200),
        initial_run: true,
        exit_when_idle: false,
    }
}

fn changed(path: &str) -> RuntimeEvent {
    RuntimeEvent::FilesChanged {
        paths: vec![PathBuf::from(path)],
    }
}

fn ok() -> RunOutcome {
    RunOutcome::Exited {
        code: Some(0),
        success: true,
    }
}

fn started(step: &CoreStep) -> Vec<&ScheduledRun> {
    step.commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::StartRun(run) => Some(run),
            CoreCommand::StopRunning => None,
        })
        .collect()
}

#[test]
fn start_runs_initial_build() {
    let t0 = Instant::now();
    let mut core = CoreRuntime::new(watching());

    let step = core.start();
    let runs = started(&step);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].reason, TriggerReason::Initial);
    assert_eq!(core.phase(), LoopPhase::Running);

    core.step(RuntimeEvent::RunFinished { run_id: 1, outcome: ok() }, t0 + ms(5));
    assert_eq!(core.phase(), LoopPhase::Idle);
}

#[test]
fn start_can_wait_for_first_change() {
    let mut core = CoreRuntime::new(RuntimeOptions {
        initial_run: false,
        ..watching()
    });

    assert!(started(&core.start()).is_empty());
    assert_eq!(core.phase(), LoopPhase::Idle);
}

#[test]
fn changes_in_one_window_start_exactly_one_run() {
    let t0 = Instant::now();
    let mut core = CoreRuntime::new(RuntimeOptions {
        initial_run: false,
        ..watching()
    });
    core.start();

    core.step(changed("src/a.txt"), t0);
    assert_eq!(core.phase(), LoopPhase::Debouncing);
    core.step(changed("src/b.txt"), t0 + ms(50));

    assert!(started(&core.on_deadline(t0 + ms(249))).is_empty());
    assert_eq!(core.next_deadline(), Some(t0 + ms(250)));

    let step = core.on_deadline(t0 + ms(250));
    let runs = started(&step);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].reason, TriggerReason::FileChange);
    assert_eq!(runs[0].events, 2);
    assert_eq!(
        runs[0].changed,
        vec![PathBuf::from("src/a.txt"), PathBuf::from("src/b.txt")]
    );
    assert_eq!(core.phase(), LoopPhase::Running);
    assert!(started(&core.on_deadline(t0 + ms(5000))).is_empty());
}

#[test]
fn trigger_while_running_supersedes_the_run() {
    let t0 = Instant::now();
    let mut core = CoreRuntime::new(watching());
    core.start();

    core.step(changed("src/lib.rs"), t0 + ms(10));
    assert_eq!(core.phase(), LoopPhase::Debouncing);
    assert_eq!(core.active_run(), Some(1));

    let step = core.on_deadline(t0 + ms(210));
    assert_eq!(started(&step)[0].run_id, 2);
    assert_eq!(core.active_run(), Some(2));

    // Late exit of the superseded run must not clear the new one.
    core.step(RuntimeEvent::RunFinished { run_id: 1, outcome: ok() }, t0 + ms(300));
    assert_eq!(core.active_run(), Some(2));
    assert_eq!(core.phase(), LoopPhase::Running);
}

#[test]
fn spawn_failure_returns_to_idle_and_keeps_watching() {
    let t0 = Instant::now();
    let mut core = CoreRuntime::new(watching());
    core.start();

    let step = core.step(
        RuntimeEvent::RunFinished {
            run_id: 1,
            outcome: RunOutcome::SpawnFailed("No such file or directory".into()),
        },
        t0,
    );
    assert!(step.keep_running);
    assert_eq!(core.phase(), LoopPhase::Idle);

    core.step(changed("src/main.rs"), t0 + ms(10));
    assert_eq!(started(&core.on_deadline(t0 + ms(210))).len(), 1);
}

#[test]
fn shutdown_from_any_phase_stops_running_and_drops_pending() {
    let t0 = Instant::now();
    let mut core = CoreRuntime::new(watching());
    core.start();
    core.step(changed("src/a.rs"), t0);

    let step = core.step(RuntimeEvent::ShutdownRequested, t0 + ms(1));
    assert!(!step.keep_running);
    assert_eq!(step.commands, vec![CoreCommand::StopRunning]);
    assert_eq!(core.phase(), LoopPhase::ShuttingDown);
    assert_eq!(core.next_deadline(), None);

    // Idempotent, and nothing new starts.
    let again = core.step(RuntimeEvent::ShutdownRequested, t0 + ms(2));
    assert!(!again.keep_running);
    core.step(changed("src/b.rs"), t0 + ms(3));
    assert!(started(&core.on_deadline(t0 + ms(1000))).is_empty());

    core.mark_stopped();
    assert_eq!(core.phase(), LoopPhase::Stopped);
}

#[test]
fn once_mode_exits_after_first_run() {
    let t0 = Instant::now();
    let mut core = CoreRuntime::new(RuntimeOptions {
        exit_when_idle: true,
        ..watching()
    });
    core.start();
    core.step(changed("src/a.rs"), t0);
    assert_eq!(core.next_deadline(), None);

    let step = core.step(
        RuntimeEvent::RunFinished {
            run_id: 1,
            outcome: RunOutcome::Exited {
                code: Some(3),
                success: false,
            },
        },
        t0 + ms(20),
    );
    assert!(!step.keep_running);

    let report = core.report();
    assert_eq!(report.runs_started, 1);
    assert_eq!(report.exit_code(), 3);
}

#[test]
fn run_ids_are_fresh_and_superseded_runs_are_stale() {
    let mut state = RunState::new(ms(100));

    let first = state.begin_run(TriggerReason::Initial, Trigger::default());
    let second = state.begin_run(TriggerReason::FileChange, Trigger::default());
    assert_eq!((first.run_id, second.run_id), (1, 2));
    assert_eq!(state.active_run(), Some(2));

    assert!(!state.finish_run(1, ok()));
    assert_eq!(state.active_run(), Some(2));

    assert!(state.finish_run(
        2,
        RunOutcome::Exited {
            code: Some(1),
            success: false
        }
    ));
    assert_eq!(state.active_run(), None);
    assert_eq!(state.phase(), LoopPhase::Idle);
}

#[test]
fn shutdown_then_stop_is_terminal() {
    let mut state = RunState::new(ms(100));
    state.record_change(vec![PathBuf::from("a")], Instant::now());
    assert_eq!(state.phase(), LoopPhase::Debouncing);

    state.begin_shutdown();
    assert_eq!(state.phase(), LoopPhase::ShuttingDown);
    assert!(!state.has_pending_trigger());

    state.mark_stopped();
    state.begin_shutdown();
    assert_eq!(state.phase(), LoopPhase::Stopped);
}

#[test]
fn watch_mode_exits_zero_regardless_of_last_run() {
    let report = LoopReport {
        runs_started: 3,
        last_outcome: Some(RunOutcome::Exited {
            code: Some(101),
            success: false,
        }),
        once: false,
    };
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn once_mode_passes_status_through() {
    let mut report = LoopReport {
        runs_started: 1,
        last_outcome: Some(RunOutcome::Exited {
            code: Some(101),
            success: false,
        }),
        once: true,
    };
    assert_eq!(report.exit_code(), 101);

    report.last_outcome = Some(RunOutcome::SpawnFailed("not found".into()));
    assert_eq!(report.exit_code(), 1);

    report.last_outcome = Some(ok());
    assert_eq!(report.exit_code(), 0);
}
