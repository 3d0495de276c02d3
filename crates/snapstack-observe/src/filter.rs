#![forbid(unsafe_code)]

//! Key filters that exclude properties from observation.
//!
//! A property whose name matches the filter is never wrapped: writes to it,
//! and to anything reached only through it, are applied to the graph but
//! are never reported. Use this for keys that are structurally special,
//! such as locale codes (`"en-US"`) used as object keys.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

type Predicate = Rc<dyn Fn(&str) -> bool>;

/// Predicate over property names. Cloning shares the predicate.
#[derive(Clone, Default)]
pub struct KeyFilter {
    predicate: Option<Predicate>,
}

impl KeyFilter {
    /// Filter with a custom predicate. Keys for which it returns `true`
    /// are excluded from observation.
    pub fn new(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            predicate: Some(Rc::new(predicate)),
        }
    }

    /// Filter that matches nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Filter matching exactly the given names.
    pub fn exact<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Self::none();
        }
        Self::new(move |key| names.contains(key))
    }

    /// Combine two filters: a key is excluded when either matches.
    #[must_use]
    pub fn or(self, other: KeyFilter) -> Self {
        match (self.predicate, other.predicate) {
            (None, None) => Self::none(),
            (Some(p), None) | (None, Some(p)) => Self { predicate: Some(p) },
            (Some(a), Some(b)) => Self::new(move |key| a(key) || b(key)),
        }
    }

    /// `true` when `key` is excluded from observation.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.predicate.as_ref().is_some_and(|p| p(key))
    }

    /// `true` when this filter can never match.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.predicate.is_none()
    }
}

impl fmt::Debug for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFilter")
            .field("active", &self.predicate.is_some())
            .finish()
    }
}
