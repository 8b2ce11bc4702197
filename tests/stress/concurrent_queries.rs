//! Concurrency test: parallel queries against shared calculators.
//!
//! Validates that queries, cache fills, and invalidations are thread-safe
//! and that an invalidation is visible to every query sequenced after it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use permcalc::{
    CalculatorRegistry, HolderHandle, ImmutableContextSet, PermissionCalculator, PermissionNode,
    ProcessorChain, StaticHolder, Tristate,
};

fn node(permission: &str, value: bool) -> PermissionNode {
    PermissionNode::new(permission, value).expect("valid node")
}

fn holder_with(count: usize) -> Arc<StaticHolder> {
    let mut nodes: Vec<PermissionNode> = (0..count)
        .map(|i| node(&format!("perm.{i}"), i % 2 == 0))
        .collect();
    nodes.push(node("group.*", true));
    nodes.push(node("r=regex\\.[0-9]+", false));
    Arc::new(StaticHolder::with_nodes("stress", nodes))
}

#[test]
fn stress_64_threads_share_one_calculator() {
    let holder = holder_with(200);
    let calc = Arc::new(PermissionCalculator::new(
        HolderHandle::new(&holder),
        ImmutableContextSet::empty(),
        Arc::new(ProcessorChain::standard()),
    ));

    let mut handles = Vec::new();
    for thread_id in 0..64 {
        let calc = Arc::clone(&calc);
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                let n = (thread_id * 7 + i) % 200;
                let expected = Tristate::from_bool(n % 2 == 0);
                assert_eq!(calc.query(&format!("perm.{n}")).result(), expected);
                assert_eq!(calc.query(&format!("group.{i}")).result(), Tristate::True);
                assert_eq!(calc.query(&format!("regex.{i}")).result(), Tristate::False);
                assert!(calc.query(&format!("missing.{i}")).is_undefined());
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let stats = calc.stats();
    assert_eq!(stats.queries, 64 * 500 * 4);
    assert_eq!(stats.cache_hits + stats.cache_misses, stats.queries);
    // first generation only: one snapshot no matter how many racing misses
    assert_eq!(stats.snapshot_builds, 1);
}

#[test]
fn stress_invalidation_visible_to_later_queries() {
    let holder = Arc::new(StaticHolder::with_nodes("flip", vec![node("toggle", false)]));
    let calc = Arc::new(PermissionCalculator::new(
        HolderHandle::new(&holder),
        ImmutableContextSet::empty(),
        Arc::new(ProcessorChain::standard()),
    ));

    // writer marks a round started before mutating and publishes it after
    // invalidating
    let started = Arc::new(AtomicU64::new(0));
    let published = Arc::new(AtomicU64::new(0));
    let done = Arc::new(AtomicBool::new(false));
    let start = Arc::new(Barrier::new(17));

    let mut readers = Vec::new();
    for _ in 0..16 {
        let calc = Arc::clone(&calc);
        let started = Arc::clone(&started);
        let published = Arc::clone(&published);
        let done = Arc::clone(&done);
        let start = Arc::clone(&start);
        readers.push(thread::spawn(move || {
            start.wait();
            while !done.load(Ordering::SeqCst) {
                let round = published.load(Ordering::SeqCst);
                let result = calc.query("toggle").result();
                // the state for `round` or a later one; never an older one
                let seen_even = result == Tristate::False;
                let round_even = round % 2 == 0;
                if seen_even != round_even {
                    let later = started.load(Ordering::SeqCst);
                    assert!(later > round, "stale result after round {round}");
                }
            }
        }));
    }

    start.wait();
    for round in 1..=200u64 {
        started.store(round, Ordering::SeqCst);
        holder.set_nodes(vec![node("toggle", round % 2 == 1)]);
        calc.invalidate_cache();
        published.store(round, Ordering::SeqCst);
    }
    done.store(true, Ordering::SeqCst);

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(calc.query("toggle").result(), Tristate::False);
}

#[test]
fn stress_registry_calculators_created_concurrently() {
    let holder = holder_with(50);
    let registry = Arc::new(CalculatorRegistry::new(
        HolderHandle::new(&holder),
        Arc::new(ProcessorChain::standard()),
    ));

    let mut handles = Vec::new();
    for thread_id in 0..32 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let world = format!("world{}", (thread_id + i) % 8);
                let ctx = ImmutableContextSet::singleton("world", &world).unwrap();
                let calc = registry.calculator_for(&ctx);
                assert_eq!(calc.query("perm.0").result(), Tristate::True);
                if i % 25 == 0 {
                    registry.invalidate_all();
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(registry.len(), 8);
}
