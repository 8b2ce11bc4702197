//! The ordered processor chain.
//!
//! Each processor is one matching strategy. The chain runs them in a fixed
//! priority order and stops at the first defined answer:
//!   exact, wildcard, regex, default
//! so an explicit assignment beats a wildcard, which beats a pattern,
//! which beats the holder-independent defaults.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::result::{ResultFactory, TristateResult};
use super::snapshot::ApplicableNodes;
use crate::node::PermissionNode;
use crate::tristate::Tristate;

/// Identifies a processor. Declaration order is priority order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    Exact,
    Wildcard,
    Regex,
    Default,
}

static FACTORIES: Lazy<[ResultFactory; 4]> = Lazy::new(|| {
    [
        ResultFactory::new(ProcessorKind::Exact),
        ResultFactory::new(ProcessorKind::Wildcard),
        ResultFactory::new(ProcessorKind::Regex),
        ResultFactory::new(ProcessorKind::Default),
    ]
});

impl ProcessorKind {
    pub const ALL: [ProcessorKind; 4] = [
        ProcessorKind::Exact,
        ProcessorKind::Wildcard,
        ProcessorKind::Regex,
        ProcessorKind::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessorKind::Exact => "exact",
            ProcessorKind::Wildcard => "wildcard",
            ProcessorKind::Regex => "regex",
            ProcessorKind::Default => "default",
        }
    }

    /// The process-wide result factory for this kind.
    pub fn factory(self) -> &'static ResultFactory {
        &FACTORIES[self as usize]
    }
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the processors read during one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    /// The holder's own applicable nodes.
    pub holder: &'a ApplicableNodes,
    /// Applicable nodes of the shared default set.
    pub defaults: &'a ApplicableNodes,
}

/// One matching strategy.
///
/// Processors hold no per-holder state and never mutate the view they are
/// given, so one chain is shared by every calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionProcessor {
    /// Verbatim lookup.
    Exact,
    /// Most specific `prefix.*` node, then the root wildcard.
    Wildcard,
    /// Full-match regex nodes, most recently added first.
    Regex,
    /// Resolves against the shared default nodes using the inner matchers.
    Default(Vec<PermissionProcessor>),
}

impl PermissionProcessor {
    pub fn kind(&self) -> ProcessorKind {
        match self {
            PermissionProcessor::Exact => ProcessorKind::Exact,
            PermissionProcessor::Wildcard => ProcessorKind::Wildcard,
            PermissionProcessor::Regex => ProcessorKind::Regex,
            PermissionProcessor::Default(_) => ProcessorKind::Default,
        }
    }

    /// Evaluate a normalised permission.
    pub fn evaluate(&self, permission: &str, view: NodeView<'_>) -> TristateResult {
        match self {
            PermissionProcessor::Exact => match_exact(permission, view.holder),
            PermissionProcessor::Wildcard => match_wildcard(permission, view.holder),
            PermissionProcessor::Regex => match_regex(permission, view.holder),
            PermissionProcessor::Default(matchers) => {
                let inner = NodeView {
                    holder: view.defaults,
                    defaults: view.defaults,
                };
                for matcher in matchers {
                    let result = matcher.evaluate(permission, inner);
                    if result.is_undefined() {
                        continue;
                    }
                    let cause = match (result.processor(), result.cause()) {
                        (Some(kind), Some(cause)) => format!("{kind}: {cause}"),
                        (Some(kind), None) => format!("{kind}: {permission}"),
                        _ => permission.to_string(),
                    };
                    return ProcessorKind::Default
                        .factory()
                        .result_with_cause(result.result(), Some(cause));
                }
                TristateResult::undefined()
            }
        }
    }
}

fn match_exact(permission: &str, nodes: &ApplicableNodes) -> TristateResult {
    match nodes.lookup_exact(permission) {
        Some(node) => ProcessorKind::Exact
            .factory()
            .result(Tristate::from_bool(node.value())),
        None => TristateResult::undefined(),
    }
}

fn match_wildcard(permission: &str, nodes: &ApplicableNodes) -> TristateResult {
    let factory = ProcessorKind::Wildcard.factory();
    let mut prefix = permission;
    while let Some(idx) = prefix.rfind('.') {
        prefix = &prefix[..idx];
        if prefix.is_empty() {
            break;
        }
        if let Some(node) = nodes.lookup_wildcard(prefix) {
            return factory.result_with_cause(
                Tristate::from_bool(node.value()),
                Some(node.permission().to_string()),
            );
        }
    }
    match nodes.root_wildcard() {
        Some(node) => factory.result_with_cause(
            Tristate::from_bool(node.value()),
            Some(node.permission().to_string()),
        ),
        None => TristateResult::undefined(),
    }
}

fn match_regex(permission: &str, nodes: &ApplicableNodes) -> TristateResult {
    for (re, node) in nodes.regex_nodes() {
        if re.is_match(permission) {
            return ProcessorKind::Regex.factory().result_with_cause(
                Tristate::from_bool(node.value()),
                Some(node.permission().to_string()),
            );
        }
    }
    TristateResult::undefined()
}

/// An immutable, shareable processor chain plus the default node set the
/// default processor consults.
#[derive(Debug, Clone)]
pub struct ProcessorChain {
    processors: Vec<PermissionProcessor>,
    default_nodes: Arc<[PermissionNode]>,
}

impl ProcessorChain {
    /// Build a chain from a set of processors.
    ///
    /// Processors are sorted into priority order and de-duplicated by kind
    /// (first occurrence kept), so callers cannot reorder the precedence.
    /// A nested default processor inside a default processor is dropped.
    pub fn new(processors: Vec<PermissionProcessor>, default_nodes: Vec<PermissionNode>) -> Self {
        Self {
            processors: canonical_order(processors, true),
            default_nodes: Arc::from(default_nodes),
        }
    }

    /// Exact, wildcard, and regex matching with no defaults.
    pub fn standard() -> Self {
        Self::new(
            vec![
                PermissionProcessor::Exact,
                PermissionProcessor::Wildcard,
                PermissionProcessor::Regex,
            ],
            Vec::new(),
        )
    }

    /// The standard chain, falling back to `defaults` with the same
    /// matching rules.
    pub fn with_defaults(defaults: Vec<PermissionNode>) -> Self {
        let matchers = vec![
            PermissionProcessor::Exact,
            PermissionProcessor::Wildcard,
            PermissionProcessor::Regex,
        ];
        let mut processors = matchers.clone();
        processors.push(PermissionProcessor::Default(matchers));
        Self::new(processors, defaults)
    }

    pub fn processors(&self) -> &[PermissionProcessor] {
        &self.processors
    }

    pub fn kinds(&self) -> Vec<ProcessorKind> {
        self.processors.iter().map(PermissionProcessor::kind).collect()
    }

    pub fn default_nodes(&self) -> &[PermissionNode] {
        &self.default_nodes
    }

    /// `true` when some processor reads the default node set.
    pub fn uses_defaults(&self) -> bool {
        self.processors
            .iter()
            .any(|p| matches!(p, PermissionProcessor::Default(_)))
    }

    /// Run the chain and return the first defined result.
    ///
    /// `on_invoke` is told about every processor actually consulted.
    pub fn evaluate(
        &self,
        permission: &str,
        view: NodeView<'_>,
        mut on_invoke: impl FnMut(ProcessorKind),
    ) -> TristateResult {
        for processor in &self.processors {
            on_invoke(processor.kind());
            let result = processor.evaluate(permission, view);
            if !result.is_undefined() {
                return result;
            }
        }
        TristateResult::undefined()
    }
}

impl Default for ProcessorChain {
    fn default() -> Self {
        Self::standard()
    }
}

fn canonical_order(
    mut processors: Vec<PermissionProcessor>,
    allow_default: bool,
) -> Vec<PermissionProcessor> {
    processors = processors
        .into_iter()
        .filter_map(|p| match p {
            PermissionProcessor::Default(inner) if allow_default => {
                Some(PermissionProcessor::Default(canonical_order(inner, false)))
            }
            PermissionProcessor::Default(_) => None,
            other => Some(other),
        })
        .collect();
    // stable: first occurrence of each kind survives dedup
    processors.sort_by_key(PermissionProcessor::kind);
    processors.dedup_by_key(|p| p.kind());
    processors
}
