//! Holders: the identities whose permissions are resolved.
//!
//! The calculator never owns a holder. It keeps a [`HolderHandle`], a
//! non-owning reference with an explicit existence check, and asks it for
//! a node snapshot whenever it rebuilds. A holder that has been dropped
//! reads as having no nodes.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::context::ImmutableContextSet;
use crate::node::{normalize_permission, PermissionNode};

/// Opaque identifier of a holder (a user or a named group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the core needs from a holder.
pub trait PermissionHolder: Send + Sync {
    fn holder_id(&self) -> &HolderId;

    /// The holder's raw nodes, in assignment order.
    fn node_snapshot(&self) -> Arc<[PermissionNode]>;

    /// The holder's present situation. Defaults to no context at all.
    fn current_context(&self) -> ImmutableContextSet {
        ImmutableContextSet::empty()
    }
}

/// Non-owning reference to a holder.
#[derive(Clone)]
pub struct HolderHandle {
    id: HolderId,
    inner: Weak<dyn PermissionHolder>,
}

impl HolderHandle {
    pub fn new<H: PermissionHolder + 'static>(holder: &Arc<H>) -> Self {
        let weak: Weak<H> = Arc::downgrade(holder);
        Self {
            id: holder.holder_id().clone(),
            inner: weak,
        }
    }

    pub fn id(&self) -> &HolderId {
        &self.id
    }

    /// `true` while the holder is still alive.
    pub fn is_present(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn upgrade(&self) -> Option<Arc<dyn PermissionHolder>> {
        self.inner.upgrade()
    }

    /// The holder's nodes, or none once it is gone.
    pub fn node_snapshot(&self) -> Arc<[PermissionNode]> {
        match self.inner.upgrade() {
            Some(holder) => holder.node_snapshot(),
            None => Arc::from(Vec::new()),
        }
    }

    pub fn current_context(&self) -> ImmutableContextSet {
        self.inner
            .upgrade()
            .map(|h| h.current_context())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for HolderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HolderHandle")
            .field("id", &self.id)
            .field("present", &self.is_present())
            .finish()
    }
}

/// In-memory holder.
///
/// Mutations do not notify anyone: whoever mutates must invalidate the
/// calculators built over this holder.
#[derive(Debug)]
pub struct StaticHolder {
    id: HolderId,
    nodes: RwLock<Arc<[PermissionNode]>>,
    context: RwLock<ImmutableContextSet>,
}

impl StaticHolder {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_nodes(id, Vec::new())
    }

    pub fn with_nodes(id: impl Into<String>, nodes: Vec<PermissionNode>) -> Self {
        Self {
            id: HolderId::new(id),
            nodes: RwLock::new(Arc::from(nodes)),
            context: RwLock::new(ImmutableContextSet::empty()),
        }
    }

    pub fn set_nodes(&self, nodes: Vec<PermissionNode>) {
        *self.nodes.write() = Arc::from(nodes);
    }

    /// Append a node; it becomes the most recent assignment.
    pub fn add_node(&self, node: PermissionNode) {
        let mut guard = self.nodes.write();
        let mut nodes = guard.to_vec();
        nodes.push(node);
        *guard = Arc::from(nodes);
    }

    /// Remove every node for `permission`. Returns how many were removed.
    pub fn remove_permission(&self, permission: &str) -> usize {
        let permission = normalize_permission(permission);
        self.retain(|n| n.permission() != permission)
    }

    /// Drop expired nodes. Returns how many were removed.
    pub fn remove_expired(&self, now: u64) -> usize {
        self.retain(|n| !n.has_expired(now))
    }

    pub fn set_current_context(&self, context: ImmutableContextSet) {
        *self.context.write() = context;
    }

    fn retain(&self, keep: impl Fn(&PermissionNode) -> bool) -> usize {
        let mut guard = self.nodes.write();
        let kept: Vec<PermissionNode> = guard.iter().filter(|n| keep(*n)).cloned().collect();
        let removed = guard.len() - kept.len();
        if removed > 0 {
            *guard = Arc::from(kept);
        }
        removed
    }
}

impl PermissionHolder for StaticHolder {
    fn holder_id(&self) -> &HolderId {
        &self.id
    }

    fn node_snapshot(&self) -> Arc<[PermissionNode]> {
        self.nodes.read().clone()
    }

    fn current_context(&self) -> ImmutableContextSet {
        self.context.read().clone()
    }
}
