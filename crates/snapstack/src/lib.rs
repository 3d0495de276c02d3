#![forbid(unsafe_code)]

//! Snapshot undo/redo history for a live, in-place mutated data graph.
//!
//! The host assigns a [`serde_json::Value`] to an [`UndoStack`], then
//! mutates it in place through the [`Observed`] handle returned by
//! [`UndoStack::data`]. Every write is recorded as a full snapshot in a
//! bounded, linear history that [`UndoStack::undo`] and [`UndoStack::redo`]
//! traverse.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use serde_json::json;
//! use snapstack::{StackOptions, UndoStack};
//!
//! let data = Rc::new(RefCell::new(None));
//! let slot = Rc::clone(&data);
//! let stack = UndoStack::with_data(
//!     json!({"str": "a"}),
//!     // The live graph is replaced on every navigation: keep the latest.
//!     StackOptions::new().with_on_change(move |d, _| *slot.borrow_mut() = Some(d.clone())),
//! );
//!
//! let current = || data.borrow().clone().unwrap();
//! current().set("str", "ab");
//! current().set("str", "abc");
//! stack.undo();
//! assert_eq!(current().at("str").get(), json!("ab"));
//! stack.redo();
//! assert_eq!(current().at("str").get(), json!("abc"));
//! ```
//!
//! # Module Structure
//!
//! - [`stack`]: [`UndoStack`], its options and callbacks
//! - [`history`]: the bounded snapshot sequence and cursor
//! - [`status`]: derived undo/redo availability
//! - [`config`]: serializable configuration and its loaders

pub mod config;
pub mod history;
pub mod stack;
pub mod status;

pub use config::{ConfigError, DEFAULT_MAX_UNDOS, StackConfig};
pub use history::{History, RecordOutcome};
pub use stack::{Origin, StackOptions, StatusCallback, UndoStack, WriteCallback};
pub use status::Status;

pub use snapstack_observe::{ContainerKind, Key, KeyFilter, Observed, Path, Target, Write};
