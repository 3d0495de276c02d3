#![forbid(unsafe_code)]

//! Property tests for [`UndoStack`] history invariants.
//!
//! Validates, for random write/undo/redo sequences:
//! - The snapshot sequence and cursor match a simple linear-history model.
//! - `len() <= max_depth()` always holds.
//! - Status is always derived from cursor and length.
//! - `on_status` fires exactly once per flip.
//! - Paused writes never record or notify.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use serde_json::{Value, json};
use snapstack::{StackOptions, Status, UndoStack};

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Write(i64),
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<i64>().prop_map(Op::Write),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

/// Reference model of a bounded linear history.
struct Model {
    snapshots: Vec<Value>,
    cursor: usize,
    max_depth: usize,
}

impl Model {
    fn new(initial: Value, max_depth: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    fn write(&mut self, snapshot: Value) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.max_depth {
            let excess = self.snapshots.len() - self.max_depth;
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    fn undo(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn redo(&mut self) {
        if self.cursor + 1 < self.snapshots.len() {
            self.cursor += 1;
        }
    }

    fn status(&self) -> Status {
        Status {
            undoable: self.cursor > 0,
            redoable: self.cursor + 2 <= self.snapshots.len(),
        }
    }
}

// ============================================================================
// Invariant 1: history matches the linear model
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn history_matches_linear_model(
        ops in ops_strategy(60),
        max_depth in 1usize..12
    ) {
        let stack = UndoStack::with_data(json!({"v": 0}), StackOptions::new().with_max_undos(max_depth));
        let mut model = Model::new(json!({"v": 0}), max_depth);

        for op in &ops {
            match op {
                Op::Write(v) => {
                    stack.data().unwrap().set("v", *v);
                    model.write(json!({"v": v}));
                }
                Op::Undo => {
                    stack.undo();
                    model.undo();
                }
                Op::Redo => {
                    stack.redo();
                    model.redo();
                }
            }

            prop_assert!(stack.len() <= stack.max_depth());
            prop_assert_eq!(stack.len(), model.snapshots.len());
            prop_assert_eq!(stack.stack_index(), Some(model.cursor));
            prop_assert_eq!(stack.status(), model.status());
            prop_assert_eq!(&stack.snapshots(), &model.snapshots);
            prop_assert_eq!(stack.data().unwrap().get(), model.snapshots[model.cursor].clone());
        }
    }
}

// ============================================================================
// Invariant 2: navigation never changes the snapshot count
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn navigation_preserves_length(
        writes in 1usize..30,
        steps in prop::collection::vec(any::<bool>(), 0..40)
    ) {
        let stack = UndoStack::with_data(json!({"v": 0}), StackOptions::new());
        for i in 0..writes {
            stack.data().unwrap().set("v", i);
        }
        let len = stack.len();
        for back in steps {
            if back {
                stack.undo();
            } else {
                stack.redo();
            }
            prop_assert_eq!(stack.len(), len);
        }
    }
}

// ============================================================================
// Invariant 3: on_status fires exactly once per flip
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn status_callback_fires_once_per_flip(
        ops in ops_strategy(60),
        max_depth in 1usize..8
    ) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let stack = UndoStack::with_data(
            json!({"v": 0}),
            StackOptions::new()
                .with_max_undos(max_depth)
                .with_on_status(move |s| seen_clone.borrow_mut().push(s)),
        );

        let mut expected = Vec::new();
        let mut last = Status::default();
        for op in &ops {
            match op {
                Op::Write(v) => {
                    stack.data().unwrap().set("v", *v);
                }
                Op::Undo => {
                    stack.undo();
                }
                Op::Redo => {
                    stack.redo();
                }
            }
            let now = stack.status();
            if now != last {
                expected.push(now);
                last = now;
            }
        }
        prop_assert_eq!(&*seen.borrow(), &expected);
    }
}

// ============================================================================
// Invariant 4: paused writes are invisible to history and callbacks
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn paused_writes_never_record(values in prop::collection::vec(any::<i64>(), 1..40)) {
        let calls = Rc::new(Cell::new(0u32));
        let on_set = Rc::clone(&calls);
        let on_change = Rc::clone(&calls);
        let stack = UndoStack::with_data(
            json!({"v": 0, "list": []}),
            StackOptions::new()
                .with_on_set(move |_, _| on_set.set(on_set.get() + 1))
                .with_on_change(move |_, _| on_change.set(on_change.get() + 1)),
        );
        let baseline = calls.get();
        stack.pause();
        let data = stack.data().unwrap();
        for v in &values {
            data.set("v", *v);
            data.at("list").push(*v);
        }
        prop_assert_eq!(stack.len(), 1);
        prop_assert_eq!(calls.get(), baseline);
        prop_assert_eq!(data.at("list").with(|l| l.as_array().map_or(0, Vec::len)), values.len());
    }
}
