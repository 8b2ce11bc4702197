//! Searching stored assignments across holders.
//!
//! Unlike the calculator, search looks at raw nodes: it answers "who has
//! an assignment matching X", regardless of context or wildcard meaning.
//!
//! Comparisons:
//!   - `==` equal, `!=` not equal
//!   - `~~` similar, `!~` not similar, as SQL `LIKE` patterns where `%`
//!     matches any run of characters and `_` exactly one

use std::cmp::Ordering;

use regex::Regex;

use crate::error::{PermissionError, Result};
use crate::holder::{HolderId, PermissionHolder};
use crate::node::{normalize_permission, PermissionNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Similar,
    NotSimilar,
}

impl Comparison {
    pub const ALL: [Comparison; 4] = [
        Comparison::Equal,
        Comparison::NotEqual,
        Comparison::Similar,
        Comparison::NotSimilar,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Similar => "~~",
            Comparison::NotSimilar => "!~",
        }
    }

    /// Parse a comparison from its symbol.
    pub fn parse(symbol: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.symbol() == symbol.trim())
            .ok_or_else(|| PermissionError::UnknownComparison(symbol.to_string()))
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A comparison against a fixed value.
#[derive(Debug, Clone)]
pub struct Constraint {
    comparison: Comparison,
    value: String,
    pattern: Option<Regex>,
}

impl Constraint {
    /// # Errors
    ///
    /// Fails when a similarity pattern cannot be compiled.
    pub fn of(comparison: Comparison, value: impl AsRef<str>) -> Result<Self> {
        let value = normalize_permission(value.as_ref());
        let pattern = match comparison {
            Comparison::Similar | Comparison::NotSimilar => Some(
                Regex::new(&like_to_regex(&value))
                    .map_err(|e| PermissionError::InvalidPattern(e.to_string()))?,
            ),
            Comparison::Equal | Comparison::NotEqual => None,
        };
        Ok(Self {
            comparison,
            value,
            pattern,
        })
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matches(&self, permission: &str) -> bool {
        let permission = normalize_permission(permission);
        match (self.comparison, &self.pattern) {
            (Comparison::Equal, _) => permission == self.value,
            (Comparison::NotEqual, _) => permission != self.value,
            (Comparison::Similar, Some(re)) => re.is_match(&permission),
            (Comparison::NotSimilar, Some(re)) => !re.is_match(&permission),
            (Comparison::Similar | Comparison::NotSimilar, None) => false,
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.comparison, self.value)
    }
}

fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out.push('$');
    out
}

/// A node held by some holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldPermission<H> {
    pub holder: H,
    pub node: PermissionNode,
}

impl<H: Ord> HeldPermission<H> {
    /// Holder, then permission, then granted before denied.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.holder
            .cmp(&other.holder)
            .then_with(|| self.node.permission().cmp(other.node.permission()))
            .then_with(|| other.node.value().cmp(&self.node.value()))
    }
}

/// Every node matching `constraint`, sorted.
pub fn search<'a, H, I>(holders: I, constraint: &Constraint) -> Vec<HeldPermission<H>>
where
    H: Ord + Clone + 'a,
    I: IntoIterator<Item = (H, &'a [PermissionNode])>,
{
    let mut results: Vec<HeldPermission<H>> = holders
        .into_iter()
        .flat_map(|(holder, nodes)| {
            nodes
                .iter()
                .filter(|n| constraint.matches(n.permission()))
                .map(move |n| HeldPermission {
                    holder: holder.clone(),
                    node: n.clone(),
                })
        })
        .collect();
    results.sort_by(HeldPermission::compare);
    results
}

/// [`search`] over live holders, keyed by their ids.
pub fn search_holders(
    holders: &[std::sync::Arc<dyn PermissionHolder>],
    constraint: &Constraint,
) -> Vec<HeldPermission<HolderId>> {
    let snapshots: Vec<(HolderId, std::sync::Arc<[PermissionNode]>)> = holders
        .iter()
        .map(|h| (h.holder_id().clone(), h.node_snapshot()))
        .collect();
    search(
        snapshots.iter().map(|(id, nodes)| (id.clone(), &nodes[..])),
        constraint,
    )
}

/// One page of a result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// 1-based page number actually shown.
    pub number: usize,
    pub total_pages: usize,
    pub items: &'a [T],
}

impl<'a, T> Page<'a, T> {
    /// Slice out page `page` (1-based). Out-of-range requests show page 1.
    pub fn of(items: &'a [T], page_size: usize, page: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = items.len().div_ceil(page_size);
        let number = if page == 0 || page > total_pages { 1 } else { page };
        let start = ((number - 1) * page_size).min(items.len());
        let end = (start + page_size).min(items.len());
        Self {
            number,
            total_pages,
            items: &items[start..end],
        }
    }
}
