//! Frozen context sets.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::entry::Context;
use super::set::{fmt_contexts, ContextMultimap, ContextSet};
use crate::error::{PermissionError, Result};

/// A context set frozen at construction.
///
/// Pairs are kept sorted and de-duplicated, so equality and hashing are
/// set semantics and membership is a binary search. Clones share storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<String>>",
    into = "ContextMultimap"
)]
pub struct ImmutableContextSet {
    contexts: Arc<[Context]>,
}

impl ImmutableContextSet {
    pub fn empty() -> Self {
        Self {
            contexts: Arc::from(Vec::new()),
        }
    }

    pub fn singleton(key: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        Ok(Self::from_contexts(vec![Context::new(key, value)?]))
    }

    pub fn of(
        key1: impl AsRef<str>,
        value1: impl AsRef<str>,
        key2: impl AsRef<str>,
        value2: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self::from_contexts(vec![
            Context::new(key1, value1)?,
            Context::new(key2, value2)?,
        ]))
    }

    /// Build from `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// Fails on the first empty key or value.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let contexts = entries
            .into_iter()
            .map(|(k, v)| Context::new(k, v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_contexts(contexts))
    }

    /// Build from a plain one-value-per-key map.
    pub fn from_map<K, V, S>(map: &HashMap<K, V, S>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self::from_entries(map.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
    }

    /// Build from a key-to-values multimap.
    pub fn from_multimap<I, K, VS, V>(multimap: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, VS)>,
        K: AsRef<str>,
        VS: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut contexts = Vec::new();
        for (key, values) in multimap {
            for value in values {
                contexts.push(Context::new(key.as_ref(), value)?);
            }
        }
        Ok(Self::from_contexts(contexts))
    }

    /// Freeze any context set. Already immutable inputs share storage.
    pub fn from_set(set: &dyn ContextSet) -> Self {
        set.make_immutable()
    }

    pub(crate) fn from_contexts(mut contexts: Vec<Context>) -> Self {
        contexts.sort();
        contexts.dedup();
        Self {
            contexts: Arc::from(contexts),
        }
    }

    /// `true` when both handles point at the same frozen storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.contexts, &other.contexts)
    }
}

impl ContextSet for ImmutableContextSet {
    fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    fn is_immutable(&self) -> bool {
        true
    }

    fn make_immutable(&self) -> ImmutableContextSet {
        self.clone()
    }

    fn has_context(&self, context: &Context) -> bool {
        self.contexts.binary_search(context).is_ok()
    }
}

impl Default for ImmutableContextSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for ImmutableContextSet {
    type Error = PermissionError;

    fn try_from(map: BTreeMap<String, Vec<String>>) -> Result<Self> {
        Self::from_multimap(map)
    }
}

impl From<ImmutableContextSet> for ContextMultimap {
    fn from(set: ImmutableContextSet) -> Self {
        set.to_multimap()
    }
}

impl<'a> IntoIterator for &'a ImmutableContextSet {
    type Item = &'a Context;
    type IntoIter = std::slice::Iter<'a, Context>;

    fn into_iter(self) -> Self::IntoIter {
        self.contexts.iter()
    }
}

impl std::fmt::Display for ImmutableContextSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_contexts(&self.contexts, f)
    }
}
