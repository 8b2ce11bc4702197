//! Context-filtered, indexed view of a node list.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::context::ContextSet;
use crate::node::{NodeShape, PermissionNode};

/// The nodes that apply under one active context at one instant.
///
/// Built once per cache generation and read by every processor. Each index
/// records the *last* applicable node for its key, so later assignments
/// override earlier ones.
#[derive(Debug, Default)]
pub struct ApplicableNodes {
    nodes: Vec<PermissionNode>,
    exact: HashMap<String, usize>,
    wildcards: HashMap<String, usize>,
    root_wildcard: Option<usize>,
    regexes: Vec<(Regex, usize)>,
    malformed: usize,
    valid_until: Option<u64>,
}

impl ApplicableNodes {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Filter `raw` down to applicable nodes, preserving order, and index
    /// them. Nodes with an uncompilable regex are skipped with a warning and
    /// left out of the view entirely.
    pub fn build(raw: &[PermissionNode], active: &dyn ContextSet, now: u64) -> Self {
        let mut view = Self::empty();
        for node in raw.iter().filter(|n| n.is_applicable(active, now)) {
            let idx = view.nodes.len();
            match node.shape() {
                NodeShape::Literal => {}
                NodeShape::Wildcard(prefix) => {
                    view.wildcards.insert(prefix.to_string(), idx);
                }
                NodeShape::RootWildcard => view.root_wildcard = Some(idx),
                NodeShape::Regex(pattern) => match compile_full_match(pattern) {
                    Ok(re) => view.regexes.push((re, idx)),
                    Err(err) => {
                        log::warn!(
                            "skipping regex node '{}': {}",
                            node.permission(),
                            err
                        );
                        view.malformed += 1;
                        continue;
                    }
                },
            }
            if let Some(expiry) = node.expiry() {
                view.valid_until = Some(view.valid_until.map_or(expiry, |v| v.min(expiry)));
            }
            view.exact.insert(node.permission().to_string(), idx);
            view.nodes.push(node.clone());
        }
        view
    }

    /// Applicable nodes in their original order.
    pub fn nodes(&self) -> &[PermissionNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn lookup_exact(&self, permission: &str) -> Option<&PermissionNode> {
        self.exact.get(permission).map(|&i| &self.nodes[i])
    }

    /// The `prefix.*` node, if any.
    pub fn lookup_wildcard(&self, prefix: &str) -> Option<&PermissionNode> {
        self.wildcards.get(prefix).map(|&i| &self.nodes[i])
    }

    pub fn root_wildcard(&self) -> Option<&PermissionNode> {
        self.root_wildcard.map(|i| &self.nodes[i])
    }

    /// Compiled regex nodes, most recently added first.
    pub fn regex_nodes(&self) -> impl Iterator<Item = (&Regex, &PermissionNode)> {
        self.regexes
            .iter()
            .rev()
            .map(move |(re, i)| (re, &self.nodes[*i]))
    }

    /// Regex nodes dropped because their pattern did not compile.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Earliest expiry among the applicable nodes. The view is stale from
    /// that instant on.
    pub fn valid_until(&self) -> Option<u64> {
        self.valid_until
    }
}

/// Anchored, case-insensitive. Queries arrive lower-cased while the
/// pattern keeps its written case.
fn compile_full_match(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(true)
        .build()
}
