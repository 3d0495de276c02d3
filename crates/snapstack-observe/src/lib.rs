#![forbid(unsafe_code)]

//! Deep write interception for JSON-shaped data graphs.
//!
//! A host hands a [`serde_json::Value`] to [`observe`] and gets back an
//! [`Observed`] handle to the root of a live graph. Nested nodes are reached
//! with [`Observed::at`] and mutated in place with [`Observed::set`],
//! [`Observed::push`] and [`Observed::remove`]. Each write is reported
//! synchronously to the graph's sink with the value written, the key, and
//! the container ([`Target`]) that owns the key.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use serde_json::json;
//! use snapstack_observe::{observe, ObserveOptions};
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let data = observe(
//!     json!({"a": {"b": 1}}),
//!     ObserveOptions::new().with_on_write(move |w| sink.borrow_mut().push(w.path())),
//! );
//!
//! data.at("a").set("b", 5);
//! assert_eq!(data.get(), json!({"a": {"b": 5}}));
//! assert_eq!(seen.borrow()[0].as_ref().unwrap().to_pointer(), "/a/b");
//! ```

pub mod filter;
pub mod key;
pub mod observed;
pub mod write;

pub use filter::KeyFilter;
pub use key::{Key, Path};
pub use observed::{MAX_ARRAY_PADDING, ObserveOptions, Observed, WriteSink, observe};
pub use write::{ContainerKind, Target, Write};
