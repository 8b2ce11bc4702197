//! Permission nodes: one stored grant or denial each.
//!
//! A node carries a permission string, its value, an optional context
//! restriction, and an optional expiry. Permission strings are dot
//! separated hierarchies (`a.b.c`) and are stored lower-cased.
//!
//! Two encodings have special meaning to the processor chain:
//!   - `a.b.*`: wildcard over everything below `a.b.`; `*` and `'*'`
//!     match every permission
//!   - `r=<pattern>` / `R=<pattern>`: regular expression, full match

use serde::{Deserialize, Serialize};

use crate::context::{ContextSet, ImmutableContextSet};
use crate::error::{PermissionError, Result};

/// Prefixes marking a regex node.
const REGEX_PREFIXES: [&str; 2] = ["r=", "R="];

/// Stored form of the regex marker.
const REGEX_MARKER: &str = "r=";

/// Root wildcard spellings.
pub const ROOT_WILDCARDS: [&str; 2] = ["*", "'*'"];

/// How a node's permission string is interpreted when matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape<'a> {
    /// Matched verbatim.
    Literal,
    /// `prefix.*`; holds `prefix`.
    Wildcard(&'a str),
    /// `*` or `'*'`.
    RootWildcard,
    /// `r=...`; holds the pattern.
    Regex(&'a str),
}

/// A single permission assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct PermissionNode {
    permission: String,
    value: bool,
    context: ImmutableContextSet,
    expiry: Option<u64>,
}

#[derive(Deserialize)]
struct RawNode {
    permission: String,
    #[serde(default = "default_value")]
    value: bool,
    #[serde(default)]
    context: ImmutableContextSet,
    #[serde(default)]
    expiry: Option<u64>,
}

fn default_value() -> bool {
    true
}

impl TryFrom<RawNode> for PermissionNode {
    type Error = PermissionError;

    fn try_from(raw: RawNode) -> Result<Self> {
        let mut builder = PermissionNode::builder(raw.permission)
            .value(raw.value)
            .context(raw.context);
        if let Some(expiry) = raw.expiry {
            builder = builder.expiry(expiry);
        }
        builder.build()
    }
}

impl PermissionNode {
    /// A permanent, unrestricted node.
    pub fn new(permission: impl AsRef<str>, value: bool) -> Result<Self> {
        Self::builder(permission).value(value).build()
    }

    pub fn builder(permission: impl AsRef<str>) -> NodeBuilder {
        NodeBuilder {
            permission: permission.as_ref().to_string(),
            value: true,
            context: ImmutableContextSet::empty(),
            expiry: None,
        }
    }

    pub fn permission(&self) -> &str {
        &self.permission
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn context(&self) -> &ImmutableContextSet {
        &self.context
    }

    /// Expiry in microseconds since the Unix epoch.
    pub fn expiry(&self) -> Option<u64> {
        self.expiry
    }

    pub fn is_temporary(&self) -> bool {
        self.expiry.is_some()
    }

    pub fn has_expired(&self, now: u64) -> bool {
        matches!(self.expiry, Some(at) if now >= at)
    }

    /// Not expired, and the restriction is satisfied by `active`.
    pub fn is_applicable(&self, active: &dyn ContextSet, now: u64) -> bool {
        !self.has_expired(now) && self.context.is_satisfied_by(active)
    }

    pub fn shape(&self) -> NodeShape<'_> {
        shape_of(&self.permission)
    }
}

/// Classify a (normalised) permission string.
pub fn shape_of(permission: &str) -> NodeShape<'_> {
    if ROOT_WILDCARDS.contains(&permission) {
        return NodeShape::RootWildcard;
    }
    for prefix in REGEX_PREFIXES {
        if let Some(pattern) = permission.strip_prefix(prefix) {
            return NodeShape::Regex(pattern);
        }
    }
    match permission.strip_suffix(".*") {
        Some(prefix) if !prefix.is_empty() => NodeShape::Wildcard(prefix),
        _ => NodeShape::Literal,
    }
}

/// Trim and lower-case a permission string.
///
/// The pattern of a regex node is kept as written: lower-casing it would
/// turn `\D` into `\d`. Only the marker becomes `r=`. Regex nodes are
/// compiled case-insensitively instead.
pub fn normalize_permission(permission: &str) -> String {
    let permission = permission.trim();
    for prefix in REGEX_PREFIXES {
        if let Some(pattern) = permission.strip_prefix(prefix) {
            return format!("{REGEX_MARKER}{pattern}");
        }
    }
    permission.to_lowercase()
}

impl std::fmt::Display for PermissionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.permission, self.value)?;
        if !self.context.is_empty() {
            write!(f, " {}", self.context)?;
        }
        if let Some(expiry) = self.expiry {
            write!(f, " (expires {})", crate::time::micros_to_rfc3339(expiry))?;
        }
        Ok(())
    }
}

/// Builder for [`PermissionNode`].
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    permission: String,
    value: bool,
    context: ImmutableContextSet,
    expiry: Option<u64>,
}

impl NodeBuilder {
    pub fn value(mut self, value: bool) -> Self {
        self.value = value;
        self
    }

    pub fn context(mut self, context: ImmutableContextSet) -> Self {
        self.context = context;
        self
    }

    /// Expire at `micros` (Unix epoch microseconds).
    pub fn expiry(mut self, micros: u64) -> Self {
        self.expiry = Some(micros);
        self
    }

    /// # Errors
    ///
    /// Returns [`PermissionError::EmptyPermission`] when the permission is
    /// empty after trimming.
    pub fn build(self) -> Result<PermissionNode> {
        let permission = normalize_permission(&self.permission);
        if permission.is_empty() {
            return Err(PermissionError::EmptyPermission);
        }
        Ok(PermissionNode {
            permission,
            value: self.value,
            context: self.context,
            expiry: self.expiry,
        })
    }
}
