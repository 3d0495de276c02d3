#![forbid(unsafe_code)]

//! Property keys and paths into a data graph.
//!
//! A [`Key`] names one step into a container: a field of an object or an
//! index of an array. A [`Path`] is the sequence of keys from the root of a
//! graph down to a node. Paths render as RFC 6901 JSON pointers so they can
//! be logged and fed to [`serde_json::Value::pointer`].

use std::fmt;

use serde_json::Value;

/// One step into a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Named field of an object.
    Field(String),
    /// Position in an array.
    Index(usize),
}

impl Key {
    /// The property name as the key filter sees it.
    ///
    /// Indices render in decimal, so index `0` is named `"0"`.
    #[must_use]
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Returns the field name, if this is a field key.
    #[must_use]
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Returns the array index, if this is an index key.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Field(_) => None,
            Self::Index(idx) => Some(*idx),
        }
    }

    /// Look this key up in `value`.
    ///
    /// Field keys resolve against objects, index keys against arrays.
    /// Anything else resolves to `None`.
    #[must_use]
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (self, value) {
            (Self::Field(name), Value::Object(map)) => map.get(name),
            (Self::Index(idx), Value::Array(items)) => items.get(*idx),
            _ => None,
        }
    }

    /// Mutable counterpart of [`lookup`](Self::lookup).
    pub fn lookup_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        match (self, value) {
            (Self::Field(name), Value::Object(map)) => map.get_mut(name),
            (Self::Index(idx), Value::Array(items)) => items.get_mut(*idx),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Field(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for Key {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

/// Location of a node, as the keys leading to it from the root.
///
/// The empty path names the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    keys: Vec<Key>,
}

impl Path {
    /// The root path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// `true` when this path names the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.keys.is_empty()
    }

    /// The keys from the root down.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Number of keys in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` for the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The last key, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Key> {
        self.keys.last()
    }

    /// A new path one step below this one.
    #[must_use]
    pub fn child(&self, key: Key) -> Self {
        let mut keys = Vec::with_capacity(self.keys.len() + 1);
        keys.extend_from_slice(&self.keys);
        keys.push(key);
        Self { keys }
    }

    /// Resolve this path inside `root`.
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.keys
            .iter()
            .try_fold(root, |node, key| key.lookup(node))
    }

    /// Mutable counterpart of [`resolve`](Self::resolve).
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.keys
            .iter()
            .try_fold(root, |node, key| key.lookup_mut(node))
    }

    /// Render as an RFC 6901 JSON pointer (`""` for the root).
    #[must_use]
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for key in &self.keys {
            out.push('/');
            match key {
                Key::Field(name) => out.push_str(&name.replace('~', "~0").replace('/', "~1")),
                Key::Index(idx) => out.push_str(&idx.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
