//! One holder's calculators, keyed by active context.
//!
//! A calculator is fixed to one context, so a holder seen in several
//! situations needs several calculators. The registry hands out the one
//! matching a context, creating it on first use, and fans invalidation
//! out to all of them when the holder's nodes change.

use std::sync::Arc;

use dashmap::DashMap;

use super::engine::PermissionCalculator;
use super::processor::ProcessorChain;
use crate::context::{ContextSet, ImmutableContextSet};
use crate::holder::HolderHandle;
use crate::time::{Clock, SystemClock};

pub struct CalculatorRegistry {
    holder: HolderHandle,
    chain: Arc<ProcessorChain>,
    clock: Arc<dyn Clock>,
    calculators: DashMap<ImmutableContextSet, Arc<PermissionCalculator>>,
}

impl CalculatorRegistry {
    pub fn new(holder: HolderHandle, chain: Arc<ProcessorChain>) -> Self {
        Self {
            holder,
            chain,
            clock: Arc::new(SystemClock),
            calculators: DashMap::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn holder(&self) -> &HolderHandle {
        &self.holder
    }

    /// The calculator for `active`, created on first request.
    pub fn calculator_for(&self, active: &dyn ContextSet) -> Arc<PermissionCalculator> {
        let key = active.make_immutable();
        if let Some(existing) = self.calculators.get(&key) {
            return existing.value().clone();
        }
        self.calculators
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(
                    PermissionCalculator::new(self.holder.clone(), key, self.chain.clone())
                        .with_clock(self.clock.clone()),
                )
            })
            .value()
            .clone()
    }

    /// The calculator for the holder's own current context.
    pub fn calculator_for_current(&self) -> Arc<PermissionCalculator> {
        self.calculator_for(&self.holder.current_context())
    }

    /// Invalidate every calculator. Call after the holder's nodes change.
    pub fn invalidate_all(&self) {
        for entry in self.calculators.iter() {
            entry.value().invalidate_cache();
        }
    }

    /// Forget the calculator for `active`, if any.
    pub fn remove(&self, active: &dyn ContextSet) -> Option<Arc<PermissionCalculator>> {
        self.calculators
            .remove(&active.make_immutable())
            .map(|(_, calc)| calc)
    }

    pub fn clear(&self) {
        self.calculators.clear();
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }
}
