//! Integration tests for surviving a process relaunch.
//!
//! Each "process" is a fresh engine over a freshly opened database file;
//! a shared manual clock stands in for wall-clock time passing between them.

use focusloop_core::{
    Database, ManualClock, Phase, PhaseEngine, PhaseEvent, Session, SessionStore,
};
use std::path::Path;

fn launch(path: &Path, clock: &ManualClock) -> PhaseEngine<ManualClock> {
    let db = Database::open_at(path).unwrap();
    PhaseEngine::with_clock(SessionStore::new(db), clock.clone())
}

fn items(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn session_survives_relaunch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusloop.db");
    let clock = ManualClock::default();

    {
        let mut engine = launch(&path, &clock);
        engine.start(&items(&["Reading", "Coding"]), 25, 5).unwrap();
    }

    clock.advance_secs(10 * 60);
    let engine = launch(&path, &clock);
    assert_eq!(engine.remaining_seconds(), 15 * 60);
    assert_eq!(
        engine.phase(),
        Phase::Focusing {
            index: 0,
            item: "Reading".into()
        }
    );
}

#[test]
fn relaunch_after_phase_ended_reconciles_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusloop.db");
    let clock = ManualClock::default();

    {
        let mut engine = launch(&path, &clock);
        engine.start(&items(&["A", "B"]), 1, 1).unwrap();
    }

    clock.advance_secs(300);
    {
        let mut engine = launch(&path, &clock);
        assert_eq!(engine.reconcile(), PhaseEvent::BreakStarted);
    }

    clock.advance_secs(30);
    let engine = launch(&path, &clock);
    assert_eq!(engine.phase(), Phase::OnBreak { index: 0 });
    assert_eq!(engine.remaining_seconds(), 30);
}

#[test]
fn full_run_across_relaunches() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusloop.db");
    let clock = ManualClock::default();

    launch(&path, &clock)
        .start(&items(&["A"]), 1, 1)
        .unwrap();

    clock.advance_secs(61);
    assert_eq!(launch(&path, &clock).reconcile(), PhaseEvent::BreakStarted);
    clock.advance_secs(61);
    assert_eq!(launch(&path, &clock).reconcile(), PhaseEvent::AllCompleted);

    let engine = launch(&path, &clock);
    assert_eq!(engine.session(), Session::idle());
    assert_eq!(engine.remaining_seconds(), 0);
}

#[test]
fn stored_layout_uses_documented_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusloop.db");
    let clock = ManualClock::default();

    let mut engine = launch(&path, &clock);
    engine.start(&items(&["A", "B"]), 2, 3).unwrap();

    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.kv_get("isTimerRunning").unwrap().as_deref(), Some("true"));
    assert_eq!(db.kv_get("isBreakTime").unwrap().as_deref(), Some("false"));
    assert_eq!(db.kv_get("currentItemIndex").unwrap().as_deref(), Some("0"));
    assert_eq!(db.kv_get("phaseDuration").unwrap().as_deref(), Some("120"));
    assert_eq!(db.kv_get("focusMinutes").unwrap().as_deref(), Some("2"));
    assert_eq!(db.kv_get("breakMinutes").unwrap().as_deref(), Some("3"));
    assert_eq!(
        db.kv_get("selectedItems").unwrap().as_deref(),
        Some(r#"["A","B"]"#)
    );
    assert!(db.kv_get("phaseStartTime").unwrap().is_some());

    engine.stop();
    assert!(db.kv_get("phaseStartTime").unwrap().is_none());
    assert_eq!(db.kv_get("isTimerRunning").unwrap().as_deref(), Some("false"));
    assert_eq!(db.kv_get("selectedItems").unwrap().as_deref(), Some("[]"));
}
