//! Observer Integration Tests
//!
//! Subscribers see full snapshots, in mutation order, starting with a replay
//! of the current state.

use std::sync::{Arc, Mutex};

use govflow::adapters::StaticGenerator;
use govflow::catalog::Catalog;
use govflow::core::{Orchestrator, StagePacing};
use govflow::domain::{Action, AppState, RunStatus, Stage};

fn orchestrator() -> Orchestrator {
    Orchestrator::builder(Catalog::builtin(), Arc::new(StaticGenerator::default()))
        .pacing(StagePacing::none())
        .build()
}

#[tokio::test]
async fn test_subscribe_replays_current_state() {
    let orch = orchestrator();
    orch.dispatch(Action::SelectFramework("acls".to_string()))
        .await
        .unwrap();

    let seen: Arc<Mutex<Vec<AppState>>> = Arc::default();
    let sink = seen.clone();
    orch.subscribe(move |state| sink.lock().unwrap().push(state.clone()));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], orch.snapshot());
    assert_eq!(seen[0].logs.len(), 1);
}

#[tokio::test]
async fn test_snapshots_follow_mutation_order() {
    let orch = orchestrator();
    orch.dispatch(Action::SelectFramework("constitution".to_string()))
        .await
        .unwrap();

    let stages: Arc<Mutex<Vec<Stage>>> = Arc::default();
    let log_lengths: Arc<Mutex<Vec<usize>>> = Arc::default();
    let (stage_sink, len_sink) = (stages.clone(), log_lengths.clone());
    orch.subscribe(move |state| {
        if let RunStatus::Running { stage } = state.run.status {
            let mut stages = stage_sink.lock().unwrap();
            if stages.last() != Some(&stage) {
                stages.push(stage);
            }
        }
        len_sink.lock().unwrap().push(state.logs.len());
    });

    orch.dispatch(Action::ExecuteNarrative("Summarize".to_string()))
        .await
        .unwrap();

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            Stage::Generation,
            Stage::Security,
            Stage::Structural,
            Stage::Symbolic,
            Stage::Phenomenological,
            Stage::Finalize,
        ]
    );

    // The log is cleared once at run start, then only grows
    let lengths = log_lengths.lock().unwrap();
    let reset_at = lengths.iter().position(|len| *len == 0).unwrap();
    for pair in lengths[reset_at..].windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    assert_eq!(*lengths.last().unwrap(), orch.snapshot().logs.len());
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let orch = orchestrator();
    let count = Arc::new(Mutex::new(0usize));
    let sink = count.clone();
    let id = orch.subscribe(move |_| *sink.lock().unwrap() += 1);
    assert_eq!(*count.lock().unwrap(), 1);

    orch.dispatch(Action::SetPrompt("one".to_string()))
        .await
        .unwrap();
    assert_eq!(*count.lock().unwrap(), 2);

    assert!(orch.unsubscribe(id));
    assert!(!orch.unsubscribe(id));

    orch.dispatch(Action::SetPrompt("two".to_string()))
        .await
        .unwrap();
    assert_eq!(*count.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_final_snapshot_is_not_loading() {
    let orch = orchestrator();
    orch.dispatch(Action::SelectFramework("bitcoin".to_string()))
        .await
        .unwrap();

    let last: Arc<Mutex<Option<AppState>>> = Arc::default();
    let sink = last.clone();
    orch.subscribe(move |state| *sink.lock().unwrap() = Some(state.clone()));

    orch.dispatch(Action::ExecuteNarrative("Explain mining".to_string()))
        .await
        .unwrap();

    let last = last.lock().unwrap().clone().unwrap();
    assert!(!last.is_loading());
    assert!(last.final_output.is_some());
    assert!(last.introspection_report.is_some());
}

#[tokio::test]
#[cfg(debug_assertions)]
#[should_panic(expected = "re-entered the orchestrator")]
async fn test_reentrant_callback_panics_in_debug() {
    let orch = orchestrator();
    let inner = orch.clone();
    orch.subscribe(move |_| {
        let _ = inner.snapshot();
    });
}

#[tokio::test]
async fn test_callback_may_read_another_orchestrator() {
    let source = orchestrator();
    let mirror = orchestrator();
    mirror
        .dispatch(Action::SelectFramework("acls".to_string()))
        .await
        .unwrap();

    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
    let (sink, other) = (seen.clone(), mirror.clone());
    source.subscribe(move |_| {
        let framework = other.snapshot().active_framework.map(|f| f.id);
        sink.lock().unwrap().push(framework);
    });

    source
        .dispatch(Action::SetPrompt("hello".to_string()))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|id| id.as_deref() == Some("acls")));
}
