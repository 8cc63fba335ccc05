//! # Tree Nodes
//!
//! Nodes live in an [`Arena`] owned by their tree. A parent owns its two
//! children through the `children` slot; the upward `parent` and lateral
//! `sibling` links are plain arena indices and never keep a node alive.
//!
//! A node's parent, sibling, and side are attached together, when its
//! parent is created, so they are stored as one optional [`Uplink`]. A
//! node with no uplink is either a root or a node still waiting for a
//! partner in the layer above.

use std::fmt;

use serde::{Deserialize, Serialize};

use mchain_core::NodeDigest;

use crate::chain::{Chain, ChainLink, Role};

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// Which child slot a node occupies under its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Left child; its digest comes first in the parent's preimage.
    Left,
    /// Right child.
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Links attached to a node once its parent exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Uplink {
    pub(crate) parent: NodeId,
    pub(crate) sibling: NodeId,
    pub(crate) side: Side,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) value: NodeDigest,
    /// `(left, right)`; `None` for leaves.
    pub(crate) children: Option<(NodeId, NodeId)>,
    pub(crate) uplink: Option<Uplink>,
}

impl Node {
    pub(crate) fn leaf(value: NodeDigest) -> Self {
        Self {
            value,
            children: None,
            uplink: None,
        }
    }
}

/// Slot storage for the nodes of one tree.
///
/// Slots released by [`Arena::release`] are recycled by the next
/// [`Arena::insert`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    vacant: Vec<NodeId>,
}

impl Arena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            vacant: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, node: Node) -> NodeId {
        match self.vacant.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Mark a slot reusable. The caller guarantees nothing reachable still
    /// points at it.
    pub(crate) fn release(&mut self, id: NodeId) {
        self.vacant.push(id);
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of occupied slots.
    pub(crate) fn live(&self) -> usize {
        self.nodes.len() - self.vacant.len()
    }

    /// Create the parent of `left` and `right` and link both children to it.
    pub(crate) fn join<H: mchain_core::MerkleHasher>(
        &mut self,
        hasher: &H,
        left: NodeId,
        right: NodeId,
    ) -> NodeId {
        let value = hasher.combine(&self.get(left).value, &self.get(right).value);
        let parent = self.insert(Node {
            value,
            children: Some((left, right)),
            uplink: None,
        });
        self.nodes[left.0].uplink = Some(Uplink {
            parent,
            sibling: right,
            side: Side::Left,
        });
        self.nodes[right.0].uplink = Some(Uplink {
            parent,
            sibling: left,
            side: Side::Right,
        });
        parent
    }
}

/// A borrowed view of one node, for walking the tree.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a Arena,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(arena: &'a Arena, id: NodeId) -> Self {
        Self { arena, id }
    }

    fn node(&self) -> &'a Node {
        self.arena.get(self.id)
    }

    fn at(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef::new(self.arena, id)
    }

    /// The node's digest.
    pub fn value(&self) -> &'a NodeDigest {
        &self.node().value
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().uplink.map(|up| self.at(up.parent))
    }

    pub fn sibling(&self) -> Option<NodeRef<'a>> {
        self.node().uplink.map(|up| self.at(up.sibling))
    }

    pub fn side(&self) -> Option<Side> {
        self.node().uplink.map(|up| up.side)
    }

    pub fn left(&self) -> Option<NodeRef<'a>> {
        self.node().children.map(|(left, _)| self.at(left))
    }

    pub fn right(&self) -> Option<NodeRef<'a>> {
        self.node().children.map(|(_, right)| self.at(right))
    }

    pub fn is_leaf(&self) -> bool {
        self.node().children.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.node().uplink.is_none()
    }

    /// Walk from this node to the root, collecting the inclusion chain.
    ///
    /// The first link is this node's value tagged `SELF`, each following
    /// link is the sibling met on the way up tagged with the sibling's
    /// side, and the last is the root's value tagged `ROOT`.
    pub fn chain(&self) -> Chain {
        let mut links = vec![ChainLink::new(self.value().clone(), Role::Origin)];
        let mut node = self.node();
        while let Some(up) = node.uplink {
            let sibling = self.arena.get(up.sibling);
            links.push(ChainLink::new(
                sibling.value.clone(),
                up.side.opposite().into(),
            ));
            node = self.arena.get(up.parent);
        }
        links.push(ChainLink::new(node.value.clone(), Role::Root));
        Chain::new(links)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("value", self.value())
            .field("side", &self.side())
            .field("leaf", &self.is_leaf())
            .finish()
    }
}
