//! permcalc: context-aware permission resolution.
//!
//! Decides, for a holder and an active context, whether a permission is
//! granted, denied, or unspecified. Provides context sets with subset
//! matching, tri-state results with provenance, an ordered processor
//! chain (exact, wildcard, regex, defaults), and a cached, thread-safe
//! calculator per holder and context.

pub mod calculator;
pub mod config;
pub mod context;
pub mod error;
pub mod holder;
pub mod node;
pub mod search;
pub mod time;
pub mod tristate;

// Re-export primary types
pub use calculator::{
    CalculatorRegistry, CalculatorStats, PermissionCalculator, PermissionProcessor,
    ProcessorChain, ProcessorKind, ResultFactory, TristateResult,
};
pub use config::CalculatorConfig;
pub use context::{Context, ContextSet, ImmutableContextSet, MutableContextSet};
pub use error::{PermissionError, Result};
pub use holder::{HolderHandle, HolderId, PermissionHolder, StaticHolder};
pub use node::PermissionNode;
pub use search::{Comparison, Constraint, HeldPermission, Page};
pub use tristate::Tristate;
