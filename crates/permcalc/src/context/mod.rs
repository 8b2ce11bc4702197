//! Contexts, the "where/when" of an assignment or a query.
//!
//! The context module provides:
//! - [`Context`], a single normalised key/value pair
//! - [`ContextSet`], the multimap query surface with subset matching
//! - [`ImmutableContextSet`] for node restrictions and snapshots
//! - [`MutableContextSet`] for accumulating an active context

pub mod entry;
pub mod immutable;
pub mod mutable;
pub mod set;

pub use entry::Context;
pub use immutable::ImmutableContextSet;
pub use mutable::MutableContextSet;
pub use set::{ContextMultimap, ContextSet};
