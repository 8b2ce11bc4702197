//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Configure a shared processor chain with default nodes
//! 2. Create holders and their per-context calculators
//! 3. Resolve exact, wildcard, regex, and default answers
//! 4. Mutate a holder and invalidate
//! 5. Let a temporary grant expire
//! 6. Search assignments across holders

use std::sync::Arc;

use permcalc::calculator::{CalculatorRegistry, ProcessorKind};
use permcalc::context::{ContextSet, ImmutableContextSet, MutableContextSet};
use permcalc::holder::{HolderHandle, PermissionHolder, StaticHolder};
use permcalc::node::PermissionNode;
use permcalc::search::{search_holders, Comparison, Constraint};
use permcalc::time::{Clock, FixedClock};
use permcalc::{CalculatorConfig, ProcessorChain, Tristate, TristateResult};

fn node(permission: &str, value: bool) -> PermissionNode {
    PermissionNode::new(permission, value).expect("valid node")
}

#[test]
fn full_workflow_configure_to_search() {
    // ── Step 1: Configure the shared chain ──────────────────────────────
    let config = CalculatorConfig::from_json_str(
        r#"{
            "default_nodes": [
                { "permission": "chat.*" },
                { "permission": "build", "value": false }
            ]
        }"#,
    )
    .expect("config should parse");
    let chain = Arc::new(ProcessorChain::from_config(&config));
    assert_eq!(
        chain.kinds(),
        vec![
            ProcessorKind::Exact,
            ProcessorKind::Wildcard,
            ProcessorKind::Regex,
            ProcessorKind::Default
        ]
    );

    // ── Step 2: Holders and calculators ─────────────────────────────────
    let clock = Arc::new(FixedClock::new(1_000_000));
    let nether = ImmutableContextSet::singleton("world", "nether").unwrap();

    let alice = Arc::new(StaticHolder::with_nodes(
        "alice",
        vec![
            node("foo.bar", true),
            node("foo.*", false),
            node("r=mine\\.(stone|coal)", true),
            PermissionNode::builder("fly")
                .context(nether.clone())
                .build()
                .unwrap(),
            node("chat.color", false),
        ],
    ));
    let registry = CalculatorRegistry::new(HolderHandle::new(&alice), chain.clone())
        .with_clock(clock.clone());

    let plain = registry.calculator_for(&ImmutableContextSet::empty());

    let mut active = MutableContextSet::new();
    active.add("world", "nether").unwrap();
    let in_nether = registry.calculator_for(&active);

    // ── Step 3: Resolve ────────────────────────────────────────────────
    let r = plain.query("foo.bar");
    assert_eq!(r.result(), Tristate::True);
    assert_eq!(r.processor(), Some(ProcessorKind::Exact));

    let r = plain.query("foo.baz");
    assert_eq!(r.result(), Tristate::False);
    assert_eq!(r.processor(), Some(ProcessorKind::Wildcard));
    assert_eq!(r.cause(), Some("foo.*"));

    let r = plain.query("mine.coal");
    assert_eq!(r.result(), Tristate::True);
    assert_eq!(r.processor(), Some(ProcessorKind::Regex));

    // holder's own denial beats the default grant
    assert_eq!(plain.query("chat.color").result(), Tristate::False);
    let r = plain.query("chat.send");
    assert_eq!(r.result(), Tristate::True);
    assert_eq!(r.processor(), Some(ProcessorKind::Default));

    assert_eq!(plain.query("build").result(), Tristate::False);
    assert!(plain.query("other").ptr_eq(&TristateResult::undefined()));

    assert!(plain.query("fly").is_undefined());
    assert_eq!(in_nether.query("fly").result(), Tristate::True);

    // ── Step 4: Mutate and invalidate ───────────────────────────────────
    alice.add_node(node("foo.bar", false));
    assert_eq!(plain.query("foo.bar").result(), Tristate::True);
    registry.invalidate_all();
    assert_eq!(plain.query("foo.bar").result(), Tristate::False);
    assert_eq!(in_nether.query("foo.bar").result(), Tristate::False);

    // ── Step 5: Temporary grant expires ─────────────────────────────────
    alice.add_node(
        PermissionNode::builder("vip.lounge")
            .expiry(2_000_000)
            .build()
            .unwrap(),
    );
    registry.invalidate_all();
    assert_eq!(plain.query("vip.lounge").result(), Tristate::True);
    clock.set(2_000_000);
    assert!(plain.query("vip.lounge").is_undefined());
    assert_eq!(alice.remove_expired(clock.now()), 1);

    // ── Step 6: Search across holders ───────────────────────────────────
    let bob = Arc::new(StaticHolder::with_nodes(
        "bob",
        vec![node("foo.bar", true), node("walk", true)],
    ));
    let holders: Vec<Arc<dyn PermissionHolder>> = vec![alice.clone(), bob];
    let found = search_holders(
        &holders,
        &Constraint::of(Comparison::Equal, "foo.bar").unwrap(),
    );
    let ids: Vec<&str> = found.iter().map(|h| h.holder.0.as_str()).collect();
    assert_eq!(ids, vec!["alice", "alice", "bob"]);

    let similar = search_holders(
        &holders,
        &Constraint::of(Comparison::Similar, "foo.%").unwrap(),
    );
    assert_eq!(similar.len(), 4);
    assert!(nether.is_satisfied_by(in_nether.context()));
}
