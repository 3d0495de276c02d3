#![forbid(unsafe_code)]

//! Undo/redo availability.

use std::fmt;

/// Whether the history can currently move back or forward.
///
/// Always derived from the cursor and the snapshot count, never stored on
/// its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Status {
    /// The cursor is past the oldest retained snapshot.
    pub undoable: bool,
    /// The cursor is before the newest snapshot.
    pub redoable: bool,
}

impl Status {
    /// Derive the status for `cursor` in a history of `len` snapshots.
    #[must_use]
    pub fn derive(cursor: Option<usize>, len: usize) -> Self {
        match cursor {
            None => Self::default(),
            Some(cursor) => Self {
                undoable: cursor > 0,
                redoable: cursor + 2 <= len,
            },
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "undoable={} redoable={}", self.undoable, self.redoable)
    }
}
