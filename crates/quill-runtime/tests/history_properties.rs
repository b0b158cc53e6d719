#![forbid(unsafe_code)]

//! Property tests for [`HistoryManager`] invariants.
//!
//! Validates:
//! - Repeated captures of identical content add at most one entry.
//! - Undo followed by redo restores the exact pre-undo snapshot.
//! - A changing capture always empties the redo stack.
//! - The undo depth never exceeds the bound and evicts oldest first.
//! - The two literal walkthroughs of the editor's undo behaviour.
//!
//! Run:
//!   cargo test -p quill-runtime --test history_properties

use proptest::prelude::*;

use quill_core::snapshot::Snapshot;
use quill_runtime::history::{DEFAULT_MAX_UNDO, HistoryConfig, HistoryManager};

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Capture(u8),
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..8).prop_map(Op::Capture),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

fn doc(n: u8) -> Snapshot {
    Snapshot::from(format!("<p>{n}</p>"))
}

/// Drive the manager the way the session does: the live content is
/// whatever was last captured or restored.
fn apply(history: &mut HistoryManager, live: &mut Snapshot, op: &Op) {
    match op {
        Op::Capture(n) => {
            *live = doc(*n);
            history.capture(live.clone());
        }
        Op::Undo => {
            if let Some(restored) = history.undo(live.clone()) {
                *live = restored;
            }
        }
        Op::Redo => {
            if let Some(restored) = history.redo(live.clone()) {
                *live = restored;
            }
        }
    }
}

// ============================================================================
// Invariant 1: Idempotence under repetition
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn repeated_captures_add_one_entry_per_distinct_run(
        values in prop::collection::vec(0u8..4, 1..60)
    ) {
        let mut history = HistoryManager::new(doc(255), HistoryConfig::unlimited());
        let mut distinct_runs = 0;
        let mut previous = None;
        for v in &values {
            if previous != Some(*v) {
                distinct_runs += 1;
            }
            previous = Some(*v);
            history.capture(doc(*v));
        }
        prop_assert_eq!(history.undo_depth(), distinct_runs);
    }
}

// ============================================================================
// Invariant 2: Undo then redo is the identity
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn undo_then_redo_round_trips(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut live = doc(100);
        let mut history = HistoryManager::with_default_config(live.clone());
        for op in &ops {
            apply(&mut history, &mut live, op);
        }
        prop_assume!(history.can_undo());

        let before = live.clone();
        let undone = history.undo(live.clone()).unwrap();
        let redone = history.redo(undone).unwrap();
        prop_assert_eq!(redone.as_str(), before.as_str());
        prop_assert_eq!(history.last_snapshot().as_str(), before.as_str());
    }
}

// ============================================================================
// Invariant 3: Branching invalidates redo
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn new_capture_clears_redo(ops in prop::collection::vec(op_strategy(), 1..80), fresh in 0u8..8) {
        let mut live = doc(100);
        let mut history = HistoryManager::with_default_config(live.clone());
        for op in &ops {
            apply(&mut history, &mut live, op);
        }
        let changed = history.capture(doc(fresh));
        if changed {
            prop_assert_eq!(history.redo_depth(), 0);
        }
        let expected = doc(fresh);
        prop_assert_eq!(history.last_snapshot().as_str(), expected.as_str());
    }
}

// ============================================================================
// Invariant 4: Bounded depth, oldest evicted first
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn depth_never_exceeds_bound(ops in prop::collection::vec(op_strategy(), 1..300)) {
        let mut live = doc(100);
        let mut history = HistoryManager::new(live.clone(), HistoryConfig::new(5));
        for op in &ops {
            apply(&mut history, &mut live, op);
            prop_assert!(history.undo_depth() <= 5);
        }
    }
}

#[test]
fn default_bound_evicts_oldest() {
    let mut history = HistoryManager::with_default_config(Snapshot::from("start"));
    for i in 0..120 {
        history.capture(Snapshot::from(format!("v{i}")));
    }
    assert_eq!(history.undo_depth(), DEFAULT_MAX_UNDO);

    let mut live = history.last_snapshot().clone();
    let mut oldest = None;
    while let Some(previous) = history.undo(live.clone()) {
        live = previous.clone();
        oldest = Some(previous);
    }
    // 120 captures after "start" leave v69..v119 reachable; v69 is the floor.
    assert_eq!(oldest.unwrap(), "v69");
}

// ============================================================================
// Walkthroughs
// ============================================================================

#[test]
fn walkthrough_undo_to_the_start_then_redo() {
    let mut history = HistoryManager::with_default_config(Snapshot::from("<p>A</p>"));
    history.capture(Snapshot::from("<p>AB</p>"));
    history.capture(Snapshot::from("<p>ABC</p>"));

    let live = Snapshot::from("<p>ABC</p>");
    let live = history.undo(live).unwrap();
    assert_eq!(live, "<p>AB</p>");
    let live = history.undo(live).unwrap();
    assert_eq!(live, "<p>A</p>");
    assert!(history.undo(live.clone()).is_none());
    assert_eq!(history.last_snapshot(), "<p>A</p>");
    assert_eq!(history.redo(live).unwrap(), "<p>AB</p>");
}

#[test]
fn walkthrough_capture_after_undo_clears_redo() {
    let mut history = HistoryManager::with_default_config(Snapshot::from("<p></p>"));
    history.capture(Snapshot::from("<p>X</p>"));
    let restored = history.undo(Snapshot::from("<p>X</p>")).unwrap();
    assert_eq!(restored, "<p></p>");
    assert_eq!(history.redo_depth(), 1);

    assert!(history.capture(Snapshot::from("<p>Y</p>")));
    assert_eq!(history.redo_depth(), 0);
    assert!(!history.can_redo());
}
