#![forbid(unsafe_code)]

//! Observed data graphs.
//!
//! # Design
//!
//! [`observe`] takes ownership of a [`Value`] and installs it as a live graph
//! in shared, reference-counted storage (`Rc<RefCell<..>>`). Hosts reach into
//! the graph through [`Observed`] handles: each handle names one node by its
//! [`Path`] from the root, and every write made through a handle is reported
//! to the graph's sink as a [`Write`] carrying the value, the key, and the
//! container that owns the key.
//!
//! Handles returned by [`Observed::at`] for a key matched by the graph's
//! [`KeyFilter`] are *unobserved*: writes through them, and through any
//! handle derived from them, still land in the graph but are never reported.
//!
//! # Invariants
//!
//! 1. Writes are applied before they are reported.
//! 2. No borrow of the graph is held while the sink runs, so the sink may
//!    read the graph or write to it again.
//! 3. After [`Observed::detach`] the sink is gone for every handle into the
//!    same graph; writes still apply but are never reported.
//!
//! # Failure Modes
//!
//! - **Dangling handle**: a handle whose path no longer resolves (the node
//!   was removed or replaced by a primitive) reads as `null` and ignores
//!   writes.
//! - **Far index**: an array write more than [`MAX_ARRAY_PADDING`] slots
//!   past the end is ignored instead of allocating the gap.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::filter::KeyFilter;
use crate::key::{Key, Path};
use crate::write::{ContainerKind, Target, Write};

/// Receiver for write notifications.
pub type WriteSink = Rc<dyn Fn(&Write)>;

/// Most `null` elements an array write past the end may pad in.
///
/// Writes that would need more are ignored.
pub const MAX_ARRAY_PADDING: usize = 1 << 16;

static NULL: Value = Value::Null;

/// Options for [`observe`].
#[derive(Clone, Default)]
pub struct ObserveOptions {
    /// Called synchronously after every reported write.
    pub on_write: Option<WriteSink>,
    /// Keys excluded from observation.
    pub filter: KeyFilter,
}

impl ObserveOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write sink.
    #[must_use]
    pub fn with_on_write(mut self, on_write: impl Fn(&Write) + 'static) -> Self {
        self.on_write = Some(Rc::new(on_write));
        self
    }

    /// Set the key filter.
    #[must_use]
    pub fn with_filter(mut self, filter: KeyFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl fmt::Debug for ObserveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserveOptions")
            .field("on_write", &self.on_write.is_some())
            .field("filter", &self.filter)
            .finish()
    }
}

/// Shared interior of one live graph.
struct Graph {
    root: RefCell<Value>,
    sink: RefCell<Option<WriteSink>>,
    filter: KeyFilter,
}

impl Graph {
    fn report(&self, write: Write) {
        // Clone the sink out so the borrow is released before the call.
        let sink = self.sink.borrow().clone();
        match sink {
            Some(sink) => sink(&write),
            None => trace!(key = ?write.key, "write to detached graph"),
        }
    }
}

/// Wrap `value` as a new live graph and return a handle to its root.
pub fn observe(value: Value, options: ObserveOptions) -> Observed {
    Observed {
        graph: Rc::new(Graph {
            root: RefCell::new(value),
            sink: RefCell::new(options.on_write),
            filter: options.filter,
        }),
        path: Path::root(),
        observed: true,
    }
}

/// Handle to one node of a live graph.
///
/// Cloning a handle is cheap and yields a handle to the **same** node of the
/// same graph.
#[derive(Clone)]
pub struct Observed {
    graph: Rc<Graph>,
    path: Path,
    observed: bool,
}

impl fmt::Debug for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observed")
            .field("path", &self.path.to_pointer())
            .field("observed", &self.observed)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl Observed {
    /// Deep copy of the node's current value (`null` if it no longer exists).
    #[must_use]
    pub fn get(&self) -> Value {
        self.with(Value::clone)
    }

    /// Access the node's value by reference without cloning.
    ///
    /// The closure sees `null` if the node no longer exists. Writing to the
    /// graph from inside `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let root = self.graph.root.borrow();
        f(self.path.resolve(&root).unwrap_or(&NULL))
    }

    /// `true` while the node exists in the graph.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.resolve(&self.graph.root.borrow()).is_some()
    }

    /// Container kind of the node, `None` for primitives and missing nodes.
    #[must_use]
    pub fn kind(&self) -> Option<ContainerKind> {
        self.with(ContainerKind::of)
    }

    /// Location of the node.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// `false` when the node was reached through a filtered key.
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// `false` once the graph has been detached from its sink.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.graph.sink.borrow().is_some()
    }

    /// `true` when both handles point into the same live graph.
    #[must_use]
    pub fn same_graph(&self, other: &Observed) -> bool {
        Rc::ptr_eq(&self.graph, &other.graph)
    }

    /// Handle to the child at `key`.
    ///
    /// The child is unobserved if `key` matches the filter or this handle is
    /// already unobserved.
    #[must_use]
    pub fn at(&self, key: impl Into<Key>) -> Observed {
        let key = key.into();
        let observed = self.observed && !self.graph.filter.matches(&key.name());
        Observed {
            graph: Rc::clone(&self.graph),
            path: self.path.child(key),
            observed,
        }
    }

    /// Write `value` to `key` of the container this handle names.
    ///
    /// Objects insert or replace the field. Arrays replace an existing
    /// element, append at `len`, and pad with `null` past `len` (up to
    /// [`MAX_ARRAY_PADDING`] elements). Returns `false` without touching
    /// the graph when the node is missing or a primitive, when it does not
    /// accept that kind of key, or when the padding bound would be exceeded.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        let kind = {
            let mut root = self.graph.root.borrow_mut();
            let Some(node) = self.path.resolve_mut(&mut root) else {
                trace!(pointer = %self.path, key = %key, "write to missing node ignored");
                return false;
            };
            match (node, &key) {
                (Value::Object(map), Key::Field(name)) => {
                    map.insert(name.clone(), value.clone());
                    ContainerKind::Object
                }
                (Value::Array(items), Key::Index(idx)) => {
                    let gap = idx.saturating_sub(items.len());
                    if gap > MAX_ARRAY_PADDING || items.try_reserve(gap + 1).is_err() {
                        trace!(
                            pointer = %self.path,
                            key = %key,
                            gap,
                            "array write too far past the end ignored"
                        );
                        return false;
                    }
                    if *idx < items.len() {
                        items[*idx] = value.clone();
                    } else {
                        items.resize(*idx, Value::Null);
                        items.push(value.clone());
                    }
                    ContainerKind::Array
                }
                _ => {
                    trace!(pointer = %self.path, key = %key, "write to non-container ignored");
                    return false;
                }
            }
        };
        self.after_write(key, kind, Some(value));
        true
    }

    /// Append `value` to the array this handle names.
    ///
    /// Reported as a write at the new element's index.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let idx = {
            let mut root = self.graph.root.borrow_mut();
            match self.path.resolve_mut(&mut root) {
                Some(Value::Array(items)) => {
                    items.push(value.clone());
                    items.len() - 1
                }
                _ => {
                    trace!(pointer = %self.path, "push to non-array ignored");
                    return false;
                }
            }
        };
        self.after_write(Key::Index(idx), ContainerKind::Array, Some(value));
        true
    }

    /// Delete `key` from the container this handle names.
    ///
    /// Array elements after the removed one shift down. Reported as a write
    /// with no value.
    pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
        let key = key.into();
        let (removed, kind) = {
            let mut root = self.graph.root.borrow_mut();
            match (self.path.resolve_mut(&mut root)?, &key) {
                (Value::Object(map), Key::Field(name)) => (map.remove(name)?, ContainerKind::Object),
                (Value::Array(items), Key::Index(idx)) if *idx < items.len() => {
                    (items.remove(*idx), ContainerKind::Array)
                }
                _ => return None,
            }
        };
        self.after_write(key, kind, None);
        Some(removed)
    }

    /// Disconnect the whole graph from its sink.
    ///
    /// Every handle into the graph keeps working, but nothing is reported
    /// any more.
    pub fn detach(&self) {
        self.graph.sink.borrow_mut().take();
    }

    fn after_write(&self, key: Key, kind: ContainerKind, value: Option<Value>) {
        if !self.observed || self.graph.filter.matches(&key.name()) {
            trace!(pointer = %self.path, key = %key, "unobserved write");
            return;
        }
        trace!(pointer = %self.path, key = %key, "observed write");
        let target = Target::new(self.path.clone(), kind);
        let write = match value {
            Some(value) => Write::assigned(value, key, target),
            None => Write::removed(key, target),
        };
        self.graph.report(write);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
