//! Permission calculation: context filtering, the processor chain, and
//! cached, attributed results.
//!
//! The calculator module provides:
//! - [`TristateResult`] and [`ResultFactory`] for attributed outcomes
//! - [`ProcessorChain`], the fixed-priority matcher pipeline
//! - [`ApplicableNodes`], the filtered and indexed node view
//! - [`PermissionCalculator`], one holder under one context, cached
//! - [`CalculatorRegistry`], a holder's calculators keyed by context

pub mod engine;
pub mod processor;
pub mod registry;
pub mod result;
pub mod snapshot;

pub use engine::{CalculatorStats, PermissionCalculator};
pub use processor::{NodeView, PermissionProcessor, ProcessorChain, ProcessorKind};
pub use registry::CalculatorRegistry;
pub use result::{ResultFactory, TristateResult};
pub use snapshot::ApplicableNodes;
