//! Integration test: context-dependent resolution.
//!
//! Exercises the applicability rule end to end: a node applies only when
//! its restriction is a subset of the active context and it has not
//! expired.

use std::sync::Arc;

use permcalc::{
    ContextSet, HolderHandle, ImmutableContextSet, MutableContextSet, PermissionCalculator,
    PermissionNode, ProcessorChain, StaticHolder, Tristate,
};

fn restricted(permission: &str, value: bool, pairs: &[(&str, &str)]) -> PermissionNode {
    PermissionNode::builder(permission)
        .value(value)
        .context(ImmutableContextSet::from_entries(pairs.iter().copied()).unwrap())
        .build()
        .unwrap()
}

fn calculator_in(holder: &Arc<StaticHolder>, pairs: &[(&str, &str)]) -> PermissionCalculator {
    let mut active = MutableContextSet::new();
    for (k, v) in pairs {
        active.add(k, v).unwrap();
    }
    PermissionCalculator::new(
        HolderHandle::new(holder),
        active.make_immutable(),
        Arc::new(ProcessorChain::standard()),
    )
}

#[test]
fn restriction_must_be_subset_of_active_context() {
    let holder = Arc::new(StaticHolder::with_nodes(
        "alice",
        vec![restricted(
            "build",
            true,
            &[("world", "nether"), ("server", "survival")],
        )],
    ));

    assert!(calculator_in(&holder, &[("world", "nether")])
        .query("build")
        .is_undefined());
    assert!(calculator_in(&holder, &[("server", "survival")])
        .query("build")
        .is_undefined());
    assert_eq!(
        calculator_in(&holder, &[("server", "survival"), ("world", "nether")])
            .query("build")
            .result(),
        Tristate::True
    );
    assert_eq!(
        calculator_in(
            &holder,
            &[("server", "survival"), ("world", "nether"), ("tag", "vip")]
        )
        .query("build")
        .result(),
        Tristate::True
    );
}

#[test]
fn context_specific_node_overrides_global_by_order() {
    // later assignment wins among applicable nodes
    let holder = Arc::new(StaticHolder::with_nodes(
        "bob",
        vec![
            PermissionNode::new("fly", false).unwrap(),
            restricted("fly", true, &[("world", "creative")]),
        ],
    ));
    assert_eq!(
        calculator_in(&holder, &[]).query("fly").result(),
        Tristate::False
    );
    assert_eq!(
        calculator_in(&holder, &[("world", "creative")])
            .query("fly")
            .result(),
        Tristate::True
    );
}

#[test]
fn multivalued_active_context() {
    let holder = Arc::new(StaticHolder::with_nodes(
        "carol",
        vec![
            restricted("kit.red", true, &[("team", "red")]),
            restricted("kit.blue", true, &[("team", "blue")]),
        ],
    ));
    let calc = calculator_in(&holder, &[("team", "red"), ("team", "blue")]);
    assert_eq!(calc.context().get_values("team").len(), 2);
    assert_eq!(calc.query("kit.red").result(), Tristate::True);
    assert_eq!(calc.query("kit.blue").result(), Tristate::True);
}

#[test]
fn past_expiry_is_excluded() {
    let holder = Arc::new(StaticHolder::with_nodes(
        "dave",
        vec![PermissionNode::builder("fly")
            .expiry(1)
            .build()
            .unwrap()],
    ));
    let calc = calculator_in(&holder, &[]);
    assert!(calc.query("fly").is_undefined());
    assert!(calc.applicable_nodes().is_empty());
}

#[test]
fn context_lookups_ignore_case() {
    let holder = Arc::new(StaticHolder::with_nodes(
        "erin",
        vec![restricted("build", true, &[("World", "Nether")])],
    ));
    let calc = calculator_in(&holder, &[("WORLD", "nether")]);
    assert_eq!(calc.query("BUILD").result(), Tristate::True);
}
