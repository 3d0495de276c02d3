#![forbid(unsafe_code)]

//! Write notifications emitted by an observed graph.

use serde_json::Value;

use crate::key::{Key, Path};

/// Shape of a mutated container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Object,
    Array,
}

impl ContainerKind {
    /// Kind of `value`, or `None` for primitives.
    #[must_use]
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => Some(Self::Object),
            Value::Array(_) => Some(Self::Array),
            _ => None,
        }
    }
}

/// The nested container a write landed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    path: Path,
    kind: ContainerKind,
}

impl Target {
    #[must_use]
    pub fn new(path: Path, kind: ContainerKind) -> Self {
        Self { path, kind }
    }

    /// Where the container sits in the graph.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.kind == ContainerKind::Array
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.kind == ContainerKind::Object
    }
}

/// One detected mutation.
///
/// An empty `Write` (all fields `None`) stands for a whole-graph
/// reassignment. A write with a key but no value is a removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Write {
    /// The value written.
    pub value: Option<Value>,
    /// The property written.
    pub key: Option<Key>,
    /// The container that owns `key`.
    pub target: Option<Target>,
}

impl Write {
    /// The notification for a whole-graph reassignment.
    #[must_use]
    pub fn whole_graph() -> Self {
        Self::default()
    }

    /// A value written to `key` inside `target`.
    #[must_use]
    pub fn assigned(value: Value, key: Key, target: Target) -> Self {
        Self {
            value: Some(value),
            key: Some(key),
            target: Some(target),
        }
    }

    /// `key` deleted from `target`.
    #[must_use]
    pub fn removed(key: Key, target: Target) -> Self {
        Self {
            value: None,
            key: Some(key),
            target: Some(target),
        }
    }

    /// `true` for whole-graph reassignments.
    #[must_use]
    pub fn is_whole_graph(&self) -> bool {
        self.value.is_none() && self.key.is_none() && self.target.is_none()
    }

    /// `true` when the write may have changed the shape of the graph:
    /// no value (reassignment or removal), `null`, or an object/array value.
    /// A `null` write may replace a whole subtree, so it counts as composite.
    /// Other scalar leaf writes return `false`.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        match &self.value {
            None => true,
            Some(value) => value.is_null() || value.is_object() || value.is_array(),
        }
    }

    /// Path of the written property, if any.
    #[must_use]
    pub fn path(&self) -> Option<Path> {
        match (&self.target, &self.key) {
            (Some(target), Some(key)) => Some(target.path().child(key.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_target() -> Target {
        Target::new(Path::root(), ContainerKind::Object)
    }

    #[test]
    fn whole_graph_write_is_composite() {
        let write = Write::whole_graph();
        assert!(write.is_whole_graph());
        assert!(write.is_composite());
        assert!(write.path().is_none());
    }

    #[test]
    fn scalar_write_is_not_composite() {
        let write = Write::assigned(json!(5), Key::from("n"), object_target());
        assert!(!write.is_composite());
        assert!(!write.is_whole_graph());
        assert_eq!(write.path().unwrap().to_pointer(), "/n");
    }

    #[test]
    fn object_and_array_writes_are_composite() {
        let obj = Write::assigned(json!({"a": 1}), Key::from("o"), object_target());
        let arr = Write::assigned(json!([1]), Key::from("a"), object_target());
        assert!(obj.is_composite());
        assert!(arr.is_composite());
    }

    #[test]
    fn null_write_is_composite() {
        let write = Write::assigned(Value::Null, Key::from("o"), object_target());
        assert!(write.is_composite());
        assert!(!write.is_whole_graph());
        let falsy = Write::assigned(json!(false), Key::from("o"), object_target());
        assert!(!falsy.is_composite());
    }

    #[test]
    fn removal_is_composite_but_not_whole_graph() {
        let write = Write::removed(Key::from("gone"), object_target());
        assert!(write.is_composite());
        assert!(!write.is_whole_graph());
    }

    #[test]
    fn container_kind_of_value() {
        assert_eq!(ContainerKind::of(&json!({})), Some(ContainerKind::Object));
        assert_eq!(ContainerKind::of(&json!([])), Some(ContainerKind::Array));
        assert_eq!(ContainerKind::of(&json!(null)), None);
        let target = Target::new(Path::root(), ContainerKind::Array);
        assert!(target.is_array());
        assert!(!target.is_object());
    }
}
