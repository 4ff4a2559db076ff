// Integration tests for the state machine: start enablement, the run
// lifecycle, and the worker-to-state folding the GUI relies on.

use camino::Utf8PathBuf;
use ini_reporter::services::{PlaceholderReport, ReportRequest};
use ini_reporter::worker::{Worker, WorkerEvent};
use ini_reporter::{PROGRESS_TICKS, StateChange, StateManager};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn start_guard_follows_input_selection() {
    let manager = StateManager::new();
    assert!(!manager.read(|s| s.can_start()));

    manager.set_input_files(vec![Utf8PathBuf::from("a.ini"), Utf8PathBuf::from("b.ini")]);
    assert!(manager.read(|s| s.can_start()));
    assert_eq!(manager.read(|s| s.input_display()), "a.ini;b.ini");

    manager.set_input_files(Vec::new());
    assert!(!manager.read(|s| s.can_start()));
}

#[test]
fn running_disables_start_until_finish() {
    let manager = StateManager::new();
    manager.set_input_files(vec![Utf8PathBuf::from("a.ini")]);

    manager.start_run();
    assert!(manager.read(|s| s.is_running));
    assert!(!manager.read(|s| s.can_start()));

    manager.finish_run(true, None);
    assert!(!manager.read(|s| s.is_running));
    assert!(manager.read(|s| s.can_start()));
}

#[tokio::test]
async fn full_run_drives_state_through_the_lifecycle() {
    let manager = Arc::new(StateManager::new());
    manager.set_input_files(vec![Utf8PathBuf::from("a.ini"), Utf8PathBuf::from("b.ini")]);

    let mut rx = manager.subscribe();

    manager.start_run();

    // Consume worker events exactly the way the GUI controller does
    let request = manager.read(|s| ReportRequest::new(s.input_files.clone(), s.output_dir.clone()));
    let task = PlaceholderReport::new(request).with_tick_interval(Duration::from_millis(1));
    let mut worker = Worker::spawn(task);

    let mut failure = None;
    while let Some(event) = worker.recv().await {
        match event {
            WorkerEvent::Progress(value) => {
                manager.record_progress(value);
            }
            WorkerEvent::Error(f) => failure = Some(f),
            WorkerEvent::Finished(ok) => {
                manager.finish_run(ok, failure.take().map(|f| f.message));
                break;
            }
        }
    }

    let snapshot = manager.snapshot();
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.last_run_ok, Some(true));
    assert_eq!(snapshot.progress, PROGRESS_TICKS);

    // Event stream: RunStarted first, progress never regressing, one
    // RunFinished at the end
    let mut events = Vec::new();
    while let Ok(change) = rx.try_recv() {
        events.push(change);
    }

    assert!(matches!(events.first(), Some(StateChange::RunStarted { .. })));

    let mut last_progress = 0;
    for event in &events {
        if let StateChange::ProgressUpdated { value } = event {
            assert!(*value >= last_progress);
            last_progress = *value;
        }
    }
    assert_eq!(last_progress, PROGRESS_TICKS);

    let finished: Vec<&StateChange> = events
        .iter()
        .filter(|e| matches!(e, StateChange::RunFinished { .. }))
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(
        finished[0],
        &StateChange::RunFinished {
            ok: true,
            error: None
        }
    );
}

#[tokio::test]
async fn failed_run_surfaces_the_error_message() {
    let manager = Arc::new(StateManager::new());
    manager.set_input_files(vec![Utf8PathBuf::from("a.ini")]);
    manager.start_run();

    let mut worker = Worker::spawn(
        |_: &ini_reporter::ProgressReporter| -> anyhow::Result<bool> {
            Err(anyhow::anyhow!("output folder is read-only"))
        },
    );

    let mut failure = None;
    while let Some(event) = worker.recv().await {
        match event {
            WorkerEvent::Progress(value) => {
                manager.record_progress(value);
            }
            WorkerEvent::Error(f) => failure = Some(f),
            WorkerEvent::Finished(ok) => {
                manager.finish_run(ok, failure.take().map(|f| f.message));
                break;
            }
        }
    }

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.last_run_ok, Some(false));
    assert_eq!(
        snapshot.last_error.as_deref(),
        Some("output folder is read-only")
    );
    // The bar still ends full so the dialog matches a settled bar
    assert_eq!(snapshot.progress, PROGRESS_TICKS);
}

#[test]
fn progress_cannot_regress_within_a_run() {
    let manager = StateManager::new();
    manager.start_run();

    manager.record_progress(6);
    manager.record_progress(3);
    manager.record_progress(8);

    assert_eq!(manager.read(|s| s.progress), 8);
}

#[test]
fn second_run_restarts_progress_from_zero() {
    let manager = StateManager::new();
    manager.set_input_files(vec![Utf8PathBuf::from("a.ini")]);

    manager.start_run();
    manager.finish_run(true, None);
    assert_eq!(manager.read(|s| s.progress), PROGRESS_TICKS);

    let changes = manager.start_run();
    assert_eq!(manager.read(|s| s.progress), 0);
    assert!(changes.contains(&StateChange::ProgressUpdated { value: 0 }));
}
