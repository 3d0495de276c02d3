#![forbid(unsafe_code)]

//! Undo/redo stack over a live, observed data graph.
//!
//! # Design
//!
//! [`UndoStack`] owns a [`History`] of full snapshots and the currently
//! installed live graph. The host mutates the graph in place through the
//! [`Observed`] handle returned by [`UndoStack::data`]; every observed write
//! is funneled into one update entry point, which records a snapshot,
//! recomputes [`Status`], and fires the host callbacks.
//!
//! Each call into the update entry point carries an [`Origin`]. Navigation
//! (`undo`/`redo`) installs a fresh graph built from a stored snapshot and
//! reports it with [`Origin::Navigation`], which never records.
//!
//! # Callbacks
//!
//! | Callback    | Fires on                                                  |
//! |-------------|-----------------------------------------------------------|
//! | `on_change` | assignment, navigation, null/object/array writes, removals|
//! | `on_set`    | every accepted write, scalar leaf writes included         |
//! | `on_status` | only when `undoable` or `redoable` flips                  |
//!
//! Callbacks run after all internal state is updated and with no borrow
//! held, so they may read the graph, write to it, or navigate.
//!
//! Each callback is handed the live graph as it stands when that callback
//! runs. If `on_status` or `on_change` navigates or reassigns, the callbacks
//! that follow for the same write receive the newly installed graph.
//!
//! # Graph identity
//!
//! `set_data`, `undo` and `redo` replace the live graph wholesale. The
//! previous graph is detached: handles into it keep working but no longer
//! feed history. Hosts should refresh their handle from `on_change` (or call
//! [`UndoStack::data`] again) after each of these.
//!
//! # Failure Modes
//!
//! - **Re-entrant borrow**: writing to the graph from inside
//!   [`Observed::with`] panics (RefCell borrow rules).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use snapstack_observe::{KeyFilter, ObserveOptions, Observed, Write, observe};
use tracing::{debug, trace, trace_span};
use web_time::Instant;

use crate::config::StackConfig;
use crate::history::History;
use crate::status::Status;

/// Callback for `on_change` and `on_set`: the live graph and the write.
pub type WriteCallback = Rc<dyn Fn(&Observed, &Write)>;

/// Callback for `on_status`.
pub type StatusCallback = Rc<dyn Fn(Status)>;

/// Where a call into the update entry point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The host assigned a whole new graph.
    Assignment,
    /// `undo` or `redo` reinstalled a stored snapshot.
    Navigation,
    /// A write inside the live graph.
    Write,
}

/// Construction options for [`UndoStack`].
#[derive(Clone, Default)]
pub struct StackOptions {
    /// Serializable settings.
    pub config: StackConfig,
    /// Keys excluded from observation, in addition to
    /// [`StackConfig::filtered_keys`].
    pub filter: KeyFilter,
    on_change: Option<WriteCallback>,
    on_set: Option<WriteCallback>,
    on_status: Option<StatusCallback>,
}

impl fmt::Debug for StackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackOptions")
            .field("config", &self.config)
            .field("filter", &self.filter)
            .field("on_change", &self.on_change.is_some())
            .field("on_set", &self.on_set.is_some())
            .field("on_status", &self.on_status.is_some())
            .finish()
    }
}

impl StackOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: StackConfig) -> Self {
        self.config = config;
        self
    }

    /// Bound on retained snapshots.
    #[must_use]
    pub fn with_max_undos(mut self, max_undos: usize) -> Self {
        self.config.max_undos = max_undos;
        self
    }

    /// Initial pause state.
    #[must_use]
    pub fn with_paused(mut self, paused: bool) -> Self {
        self.config.paused = paused;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: KeyFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Called when the shape of the graph may have changed. Hosts holding
    /// a handle should replace it with the one passed here.
    #[must_use]
    pub fn with_on_change(mut self, f: impl Fn(&Observed, &Write) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    /// Called on every accepted write.
    #[must_use]
    pub fn with_on_set(mut self, f: impl Fn(&Observed, &Write) + 'static) -> Self {
        self.on_set = Some(Rc::new(f));
        self
    }

    /// Called when undo/redo availability flips.
    #[must_use]
    pub fn with_on_status(mut self, f: impl Fn(Status) + 'static) -> Self {
        self.on_status = Some(Rc::new(f));
        self
    }
}

/// Host callbacks. Fixed at construction.
struct Hooks {
    on_change: Option<WriteCallback>,
    on_set: Option<WriteCallback>,
    on_status: Option<StatusCallback>,
}

struct StackState {
    history: History,
    paused: bool,
    /// Last status announced (or the initial all-false status).
    status: Status,
    live: Option<Observed>,
}

struct Shared {
    state: RefCell<StackState>,
    hooks: Hooks,
    filter: KeyFilter,
}

/// Callback work decided under the state borrow, run after it is released.
struct Pending {
    flipped: Option<Status>,
    notify: bool,
}

impl Shared {
    /// Build a new live graph from `value`, swap it in, and report it.
    fn install(self: &Rc<Self>, value: Value, origin: Origin) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let options = ObserveOptions::new()
            .with_filter(self.filter.clone())
            .with_on_write(move |write| {
                if let Some(shared) = weak.upgrade() {
                    shared.update(Origin::Write, write);
                }
            });
        let graph = observe(value, options);
        let previous = self.state.borrow_mut().live.replace(graph);
        if let Some(previous) = previous {
            previous.detach();
        }
        self.update(origin, &Write::whole_graph());
    }

    fn live(&self) -> Option<Observed> {
        self.state.borrow().live.clone()
    }

    /// The update entry point.
    fn update(&self, origin: Origin, write: &Write) {
        let start = Instant::now();
        let span = trace_span!(
            "snapstack.update",
            origin = ?origin,
            recorded = tracing::field::Empty,
            depth = tracing::field::Empty,
            duration_us = tracing::field::Empty
        );
        let _guard = span.enter();

        let pending = {
            let mut state = self.state.borrow_mut();
            // The first assignment is always recorded and announced.
            let initial = state.history.is_empty();
            let suppressed = state.paused && !initial;
            let recorded = origin != Origin::Navigation && !suppressed;

            if recorded {
                let snapshot = state.live.as_ref().map_or(Value::Null, Observed::get);
                let outcome = state.history.record(snapshot);
                if outcome.truncated > 0 {
                    debug!(truncated = outcome.truncated, "redo branch discarded");
                }
                if outcome.evicted > 0 {
                    debug!(
                        evicted = outcome.evicted,
                        max_depth = state.history.max_depth(),
                        "oldest snapshot evicted"
                    );
                }
            } else if suppressed {
                trace!(key = ?write.key, "update suppressed while paused");
            }

            let next = state.history.status();
            let flipped = (next != state.status).then_some(next);
            state.status = next;

            span.record("recorded", recorded);
            span.record("depth", state.history.len() as u64);
            Pending {
                flipped,
                notify: !suppressed,
            }
        };

        if let Some(status) = pending.flipped {
            debug!(%status, "status changed");
            if let Some(on_status) = &self.hooks.on_status {
                on_status(status);
            }
        }

        if pending.notify {
            // Re-read the live graph per callback: an earlier one may have
            // navigated.
            if write.is_composite()
                && let Some(on_change) = &self.hooks.on_change
                && let Some(data) = self.live()
            {
                on_change(&data, write);
            }
            if let Some(on_set) = &self.hooks.on_set
                && let Some(data) = self.live()
            {
                on_set(&data, write);
            }
        }

        span.record("duration_us", start.elapsed().as_micros() as u64);
    }
}

/// Snapshot undo/redo history for one live data graph.
///
/// Cloning an `UndoStack` creates a new handle to the **same** history, so
/// a clone can be moved into a callback to navigate from inside it.
///
/// # Invariants
///
/// 1. `len() <= max_depth()` after any operation.
/// 2. `stack_index()` is `None` iff no data has been assigned yet.
/// 3. `undo`/`redo` never change `len()`.
/// 4. `on_status` fires exactly once per flip of either flag.
pub struct UndoStack {
    shared: Rc<Shared>,
}

impl Clone for UndoStack {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("UndoStack")
            .field("len", &state.history.len())
            .field("stack_index", &state.history.cursor())
            .field("max_depth", &state.history.max_depth())
            .field("paused", &state.paused)
            .field("status", &state.status)
            .finish()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(StackOptions::default())
    }
}

impl UndoStack {
    /// Create an empty stack. Nothing is tracked until
    /// [`set_data`](Self::set_data) is called.
    #[must_use]
    pub fn new(options: StackOptions) -> Self {
        let StackOptions {
            config,
            filter,
            on_change,
            on_set,
            on_status,
        } = options;
        let filter = config.key_filter().or(filter);
        let history = History::new(config.effective_max_depth());
        debug!(max_depth = history.max_depth(), paused = config.paused, "undo stack created");
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(StackState {
                    history,
                    paused: config.paused,
                    status: Status::default(),
                    live: None,
                }),
                hooks: Hooks {
                    on_change,
                    on_set,
                    on_status,
                },
                filter,
            }),
        }
    }

    /// Create a stack and assign its initial data.
    #[must_use]
    pub fn with_data(data: Value, options: StackOptions) -> Self {
        let stack = Self::new(options);
        stack.set_data(data);
        stack
    }

    // ====================================================================
    // Data
    // ====================================================================

    /// Install `data` as the new live graph and record it.
    ///
    /// The first assignment is always recorded and announced, even while
    /// paused. Later assignments are new history entries like any write.
    pub fn set_data(&self, data: Value) {
        self.shared.install(data, Origin::Assignment);
    }

    /// Handle to the root of the live graph, `None` before the first
    /// assignment.
    #[must_use]
    pub fn data(&self) -> Option<Observed> {
        self.shared.live()
    }

    // ====================================================================
    // Navigation
    // ====================================================================

    /// Step back one snapshot. Returns `false` (and does nothing) when
    /// there is nothing to undo.
    pub fn undo(&self) -> bool {
        let snapshot = self.shared.state.borrow_mut().history.step_back().cloned();
        self.navigate(snapshot, "undo")
    }

    /// Step forward one snapshot. Returns `false` (and does nothing) when
    /// there is nothing to redo.
    pub fn redo(&self) -> bool {
        let snapshot = self
            .shared
            .state
            .borrow_mut()
            .history
            .step_forward()
            .cloned();
        self.navigate(snapshot, "redo")
    }

    fn navigate(&self, snapshot: Option<Value>, direction: &'static str) -> bool {
        let Some(snapshot) = snapshot else {
            trace!(direction, "nothing to navigate to");
            return false;
        };
        debug!(direction, stack_index = ?self.stack_index(), "navigating");
        self.shared.install(snapshot, Origin::Navigation);
        true
    }

    // ====================================================================
    // Pause
    // ====================================================================

    /// Stop recording and announcing writes. Writes still apply.
    pub fn pause(&self) {
        self.shared.state.borrow_mut().paused = true;
        debug!("paused");
    }

    /// Resume recording. With `fire_change`, `on_change` fires once with the
    /// current data so the host can resynchronize; no snapshot is recorded.
    pub fn unpause(&self, fire_change: bool) {
        let data = {
            let mut state = self.shared.state.borrow_mut();
            state.paused = false;
            state.live.clone()
        };
        debug!(fire_change, "unpaused");
        if !fire_change {
            return;
        }
        if let (Some(data), Some(on_change)) = (data, &self.shared.hooks.on_change) {
            on_change(&data, &Write::whole_graph());
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.state.borrow().paused
    }

    // ====================================================================
    // Query
    // ====================================================================

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.borrow().history.len()
    }

    /// `true` before the first assignment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.borrow().history.is_empty()
    }

    /// Index of the current snapshot, `None` before the first assignment.
    #[must_use]
    pub fn stack_index(&self) -> Option<usize> {
        self.shared.state.borrow().history.cursor()
    }

    /// Copy of the snapshot at the cursor.
    ///
    /// Differs from [`data`](Self::data) while paused or after writes to
    /// filtered keys, which change the live graph without recording.
    #[must_use]
    pub fn current_snapshot(&self) -> Option<Value> {
        self.shared.state.borrow().history.current().cloned()
    }

    /// Copy of the snapshot at `index`, oldest first.
    #[must_use]
    pub fn snapshot(&self, index: usize) -> Option<Value> {
        self.shared.state.borrow().history.get(index).cloned()
    }

    /// Copies of all retained snapshots, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> Vec<Value> {
        self.shared.state.borrow().history.iter().cloned().collect()
    }

    /// Bound on retained snapshots.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.shared.state.borrow().history.max_depth()
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.shared.state.borrow().history.status()
    }

    #[must_use]
    pub fn undoable(&self) -> bool {
        self.status().undoable
    }

    #[must_use]
    pub fn redoable(&self) -> bool {
        self.status().redoable
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
