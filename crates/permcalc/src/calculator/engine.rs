//! Per-holder, per-context permission calculator with a result cache.
//!
//! A calculator is bound to one holder and one active context for its
//! whole life. Cached state lives in a *generation*: the filtered node
//! snapshot plus the result map. Invalidation swaps in a fresh generation,
//! so a query that started before the swap can only ever write into the
//! discarded one and never leaks a stale answer past the invalidation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::Serialize;

use super::processor::{NodeView, ProcessorChain};
use super::result::TristateResult;
use super::snapshot::ApplicableNodes;
use crate::context::ImmutableContextSet;
use crate::holder::{HolderHandle, HolderId};
use crate::node::{normalize_permission, PermissionNode};
use crate::time::{Clock, SystemClock};

/// Counters describing a calculator's work so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalculatorStats {
    pub queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Individual processor evaluations across all misses.
    pub processor_invocations: u64,
    pub snapshot_builds: u64,
    pub invalidations: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    queries: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    processor_invocations: AtomicU64,
    snapshot_builds: AtomicU64,
    invalidations: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn load(&self) -> CalculatorStats {
        CalculatorStats {
            queries: self.queries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            processor_invocations: self.processor_invocations.load(Ordering::Relaxed),
            snapshot_builds: self.snapshot_builds.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

struct Snapshot {
    holder: ApplicableNodes,
    defaults: ApplicableNodes,
    valid_until: Option<u64>,
}

impl Snapshot {
    fn view(&self) -> NodeView<'_> {
        NodeView {
            holder: &self.holder,
            defaults: &self.defaults,
        }
    }
}

#[derive(Default)]
struct Generation {
    snapshot: OnceCell<Snapshot>,
    results: DashMap<String, TristateResult>,
}

/// Resolves permissions for one holder under one active context.
///
/// Safe to share across threads. Concurrent misses on the same
/// permission may compute it twice; both computations see the same
/// snapshot and agree.
pub struct PermissionCalculator {
    holder: HolderHandle,
    context: ImmutableContextSet,
    chain: Arc<ProcessorChain>,
    clock: Arc<dyn Clock>,
    generation: RwLock<Arc<Generation>>,
    stats: StatsCounters,
}

impl PermissionCalculator {
    pub fn new(holder: HolderHandle, context: ImmutableContextSet, chain: Arc<ProcessorChain>) -> Self {
        Self {
            holder,
            context,
            chain,
            clock: Arc::new(SystemClock),
            generation: RwLock::new(Arc::new(Generation::default())),
            stats: StatsCounters::default(),
        }
    }

    /// Replace the clock used for expiry decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn holder_id(&self) -> &HolderId {
        self.holder.id()
    }

    pub fn holder(&self) -> &HolderHandle {
        &self.holder
    }

    /// The active context this calculator is bound to.
    pub fn context(&self) -> &ImmutableContextSet {
        &self.context
    }

    pub fn chain(&self) -> &Arc<ProcessorChain> {
        &self.chain
    }

    /// Resolve `permission`.
    ///
    /// Never fails: an empty permission, a missing holder, or a holder with
    /// no nodes all resolve to the shared undefined result.
    pub fn query(&self, permission: &str) -> TristateResult {
        StatsCounters::bump(&self.stats.queries);
        let permission = normalize_permission(permission);
        if permission.is_empty() {
            log::debug!("empty permission queried for holder {}", self.holder.id());
            return TristateResult::undefined();
        }

        let generation = self.current_generation();
        if let Some(hit) = generation.results.get(&permission) {
            StatsCounters::bump(&self.stats.cache_hits);
            return hit.value().clone();
        }
        StatsCounters::bump(&self.stats.cache_misses);

        let snapshot = generation.snapshot.get_or_init(|| self.build_snapshot());
        let result = self.chain.evaluate(&permission, snapshot.view(), |_| {
            StatsCounters::bump(&self.stats.processor_invocations)
        });
        log::trace!(
            "holder {} {} {} -> {}",
            self.holder.id(),
            self.context,
            permission,
            result
        );
        generation.results.insert(permission, result.clone());
        result
    }

    /// Drop every cached result and the node snapshot.
    ///
    /// Queries sequenced after this call observe the holder's nodes as of
    /// this call or later.
    pub fn invalidate_cache(&self) {
        *self.generation.write() = Arc::new(Generation::default());
        StatsCounters::bump(&self.stats.invalidations);
        log::debug!(
            "invalidated calculator for holder {} in {}",
            self.holder.id(),
            self.context
        );
    }

    /// The applicable holder nodes in their original order.
    pub fn applicable_nodes(&self) -> Vec<PermissionNode> {
        let generation = self.current_generation();
        let snapshot = generation.snapshot.get_or_init(|| self.build_snapshot());
        snapshot.holder.nodes().to_vec()
    }

    /// Number of cached results in the current generation.
    pub fn cached_len(&self) -> usize {
        self.generation.read().results.len()
    }

    pub fn stats(&self) -> CalculatorStats {
        self.stats.load()
    }

    /// The live generation, retiring it first if a temporary node in its
    /// snapshot has expired since it was built.
    fn current_generation(&self) -> Arc<Generation> {
        let generation = self.generation.read().clone();
        let expired = generation
            .snapshot
            .get()
            .and_then(|s| s.valid_until)
            .is_some_and(|at| self.clock.now() >= at);
        if !expired {
            return generation;
        }

        let mut guard = self.generation.write();
        if Arc::ptr_eq(&*guard, &generation) {
            log::debug!(
                "temporary node expired for holder {}; rebuilding",
                self.holder.id()
            );
            *guard = Arc::new(Generation::default());
            StatsCounters::bump(&self.stats.invalidations);
        }
        guard.clone()
    }

    fn build_snapshot(&self) -> Snapshot {
        StatsCounters::bump(&self.stats.snapshot_builds);
        let now = self.clock.now();
        let raw = self.holder.node_snapshot();
        let holder = ApplicableNodes::build(&raw, &self.context, now);
        let defaults = if self.chain.uses_defaults() {
            ApplicableNodes::build(self.chain.default_nodes(), &self.context, now)
        } else {
            ApplicableNodes::empty()
        };
        let valid_until = match (holder.valid_until(), defaults.valid_until()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        log::debug!(
            "built snapshot for holder {} in {}: {}/{} nodes applicable",
            self.holder.id(),
            self.context,
            holder.len(),
            raw.len()
        );
        Snapshot {
            holder,
            defaults,
            valid_until,
        }
    }
}

impl std::fmt::Debug for PermissionCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCalculator")
            .field("holder", &self.holder)
            .field("context", &self.context)
            .field("chain", &self.chain.kinds())
            .finish()
    }
}
