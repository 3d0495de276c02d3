#![forbid(unsafe_code)]

//! Bounded, linear snapshot history.
//!
//! [`History`] keeps full, independent copies of the data graph in one
//! ordered sequence plus a cursor naming the current snapshot.
//!
//! # Architecture
//!
//! ```text
//! record(s3)
//! ┌──────────────────────────────────────────────┐
//! │ Snapshots: [s0, s1, s2, s3]                  │
//! │ Cursor:                  ^                   │
//! └──────────────────────────────────────────────┘
//!
//! step_back() x2
//! ┌──────────────────────────────────────────────┐
//! │ Snapshots: [s0, s1, s2, s3]                  │
//! │ Cursor:         ^                            │
//! └──────────────────────────────────────────────┘
//!
//! record(s4): the redo branch is discarded
//! ┌──────────────────────────────────────────────┐
//! │ Snapshots: [s0, s1, s4]                      │
//! │ Cursor:             ^                        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. The cursor is `None` iff there are no snapshots.
//! 2. `len() <= max_depth` after any operation.
//! 3. After `record`, the cursor names the snapshot just recorded.
//! 4. Stepping never adds or removes snapshots.

use std::collections::VecDeque;
use std::fmt;

use serde_json::Value;

use crate::status::Status;

/// What a call to [`History::record`] discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Snapshots after the cursor dropped to keep history linear.
    pub truncated: usize,
    /// Oldest snapshots dropped to respect the depth bound.
    pub evicted: usize,
}

/// Snapshot sequence with a cursor and a depth bound.
#[derive(Clone)]
pub struct History {
    snapshots: VecDeque<Value>,
    cursor: Option<usize>,
    max_depth: usize,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.snapshots.len())
            .field("cursor", &self.cursor)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl History {
    /// Empty history retaining at most `max_depth` snapshots (at least one).
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            cursor: None,
            max_depth: max_depth.max(1),
        }
    }

    /// Record `snapshot` as the new current state.
    ///
    /// Snapshots after the cursor are dropped first. If the bound is then
    /// exceeded, the oldest snapshots are evicted and the cursor shifts so
    /// it still names `snapshot`.
    pub fn record(&mut self, snapshot: Value) -> RecordOutcome {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        let truncated = self.snapshots.len().saturating_sub(keep);
        self.snapshots.truncate(keep);
        self.snapshots.push_back(snapshot);

        let mut evicted = 0;
        while self.snapshots.len() > self.max_depth {
            self.snapshots.pop_front();
            evicted += 1;
        }
        self.cursor = Some(self.snapshots.len() - 1);
        RecordOutcome { truncated, evicted }
    }

    /// Move the cursor back one step and return the snapshot it now names.
    ///
    /// Returns `None`, leaving the cursor alone, at the oldest snapshot.
    pub fn step_back(&mut self) -> Option<&Value> {
        let cursor = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(cursor);
        self.snapshots.get(cursor)
    }

    /// Move the cursor forward one step and return the snapshot it now names.
    ///
    /// Returns `None`, leaving the cursor alone, at the newest snapshot.
    pub fn step_forward(&mut self) -> Option<&Value> {
        let cursor = self.cursor.filter(|&c| c + 1 < self.snapshots.len())? + 1;
        self.cursor = Some(cursor);
        self.snapshots.get(cursor)
    }

    /// The snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&Value> {
        self.snapshots.get(self.cursor?)
    }

    /// Snapshot at `index`, oldest first.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.snapshots.get(index)
    }

    /// All retained snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.snapshots.iter()
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn status(&self) -> Status {
        Status::derive(self.cursor, self.snapshots.len())
    }
}
