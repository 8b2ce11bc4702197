//! Growable context sets used to accumulate an active context.

use std::collections::HashSet;

use super::entry::{normalize, Context};
use super::immutable::ImmutableContextSet;
use super::set::{fmt_contexts, ContextSet};
use crate::error::Result;

/// A context set that can be edited after construction.
///
/// Iteration follows insertion order. Adding a pair that is already
/// present is a no-op, so the set never holds duplicates.
#[derive(Debug, Clone, Default)]
pub struct MutableContextSet {
    contexts: Vec<Context>,
}

impl MutableContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut set = Self::new();
        for (k, v) in entries {
            set.add(k, v)?;
        }
        Ok(set)
    }

    pub(crate) fn from_contexts(contexts: impl IntoIterator<Item = Context>) -> Self {
        let mut set = Self::new();
        for ctx in contexts {
            set.add_context(ctx);
        }
        set
    }

    /// Add a pair.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PermissionError::InvalidContext`] for an empty key
    /// or value.
    pub fn add(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        self.add_context(Context::new(key, value)?);
        Ok(())
    }

    pub fn add_context(&mut self, context: Context) {
        if !self.contexts.contains(&context) {
            self.contexts.push(context);
        }
    }

    /// Add every pair of `other`.
    pub fn add_all(&mut self, other: &dyn ContextSet) {
        for ctx in other.contexts() {
            self.add_context(ctx.clone());
        }
    }

    /// Remove one pair. Returns whether it was present.
    pub fn remove(&mut self, key: &str, value: &str) -> bool {
        let key = normalize(key);
        let value = normalize(value);
        let before = self.contexts.len();
        self.contexts
            .retain(|c| !(c.key() == key && c.value() == value));
        before != self.contexts.len()
    }

    /// Remove every value recorded under `key`.
    pub fn remove_all(&mut self, key: &str) {
        let key = normalize(key);
        self.contexts.retain(|c| c.key() != key);
    }

    pub fn clear(&mut self) {
        self.contexts.clear();
    }
}

impl ContextSet for MutableContextSet {
    fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    fn is_immutable(&self) -> bool {
        false
    }

    fn make_immutable(&self) -> ImmutableContextSet {
        ImmutableContextSet::from_contexts(self.contexts.clone())
    }
}

impl PartialEq for MutableContextSet {
    fn eq(&self, other: &Self) -> bool {
        self.contexts.len() == other.contexts.len()
            && self.contexts.iter().collect::<HashSet<_>>()
                == other.contexts.iter().collect::<HashSet<_>>()
    }
}

impl Eq for MutableContextSet {}

impl<'a> IntoIterator for &'a MutableContextSet {
    type Item = &'a Context;
    type IntoIter = std::slice::Iter<'a, Context>;

    fn into_iter(self) -> Self::IntoIter {
        self.contexts.iter()
    }
}

impl std::fmt::Display for MutableContextSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_contexts(&self.contexts, f)
    }
}
