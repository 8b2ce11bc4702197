//! The shared query surface of both context set variants.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::entry::{normalize, Context};
use super::immutable::ImmutableContextSet;
use super::mutable::MutableContextSet;

/// Key to values view of a context set.
pub type ContextMultimap = BTreeMap<String, BTreeSet<String>>;

/// A multimap of context keys to values.
///
/// A key may carry several values at once, so this is deliberately not a
/// plain map. Keys and values are compared case-insensitively; lookups
/// normalise their arguments the same way construction does.
pub trait ContextSet {
    /// The pairs held by this set, in iteration order.
    ///
    /// Insertion order for [`MutableContextSet`]; sorted for
    /// [`ImmutableContextSet`].
    fn contexts(&self) -> &[Context];

    /// `true` for frozen instances.
    fn is_immutable(&self) -> bool;

    /// Return a frozen view of this set.
    ///
    /// An already immutable set returns itself (sharing storage); a
    /// mutable set is copied.
    fn make_immutable(&self) -> ImmutableContextSet;

    /// Always returns a fresh mutable copy.
    fn mutable_copy(&self) -> MutableContextSet {
        MutableContextSet::from_contexts(self.contexts().iter().cloned())
    }

    /// Snapshot of the pairs. Never reflects later mutation.
    fn to_set(&self) -> HashSet<Context> {
        self.contexts().iter().cloned().collect()
    }

    /// Snapshot grouped by key. Never reflects later mutation.
    fn to_multimap(&self) -> ContextMultimap {
        let mut map = ContextMultimap::new();
        for ctx in self.contexts() {
            map.entry(ctx.key().to_string())
                .or_default()
                .insert(ctx.value().to_string());
        }
        map
    }

    fn iter(&self) -> std::slice::Iter<'_, Context> {
        self.contexts().iter()
    }

    fn contains_key(&self, key: &str) -> bool {
        let key = normalize(key);
        self.contexts().iter().any(|c| c.key() == key)
    }

    /// All values recorded for `key`; empty when the key is absent.
    fn get_values(&self, key: &str) -> BTreeSet<String> {
        let key = normalize(key);
        self.contexts()
            .iter()
            .filter(|c| c.key() == key)
            .map(|c| c.value().to_string())
            .collect()
    }

    /// Any one value recorded for `key`.
    fn get_any_value(&self, key: &str) -> Option<String> {
        let key = normalize(key);
        self.contexts()
            .iter()
            .find(|c| c.key() == key)
            .map(|c| c.value().to_string())
    }

    fn has(&self, key: &str, value: &str) -> bool {
        let key = normalize(key);
        let value = normalize(value);
        self.contexts()
            .iter()
            .any(|c| c.key() == key && c.value() == value)
    }

    /// Membership test for an already-normalised pair.
    fn has_context(&self, context: &Context) -> bool {
        self.contexts().contains(context)
    }

    /// `true` iff every pair in `self` is also present in `other`.
    ///
    /// An empty set is satisfied by anything; a non-empty set is never
    /// satisfied by an empty one. Reflexive but not symmetric.
    fn is_satisfied_by(&self, other: &dyn ContextSet) -> bool {
        let mine = self.contexts();
        let theirs = other.contexts();
        if std::ptr::eq(mine, theirs) {
            return true;
        }
        if mine.is_empty() {
            return true;
        }
        if theirs.is_empty() || mine.len() > theirs.len() {
            return false;
        }
        mine.iter().all(|ctx| other.has_context(ctx))
    }

    fn is_empty(&self) -> bool {
        self.contexts().is_empty()
    }

    /// Number of pairs (not distinct keys).
    fn size(&self) -> usize {
        self.contexts().len()
    }
}

/// Render a set as `{k=v, k2=v2}`.
pub(crate) fn fmt_contexts(
    contexts: &[Context],
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    f.write_str("{")?;
    for (i, ctx) in contexts.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ctx}")?;
    }
    f.write_str("}")
}
