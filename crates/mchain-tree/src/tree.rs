//! # Merkle Tree Typestate
//!
//! Implements the tree lifecycle using the typestate pattern. Each state is
//! a distinct type, so requesting a chain from a tree that was never built
//! is a compile error, not a runtime check.
//!
//! ## States
//!
//! - `Unbuilt` → leaves are being collected; no internal nodes exist.
//! - `Built` → every layer is materialized and the root is known.
//!
//! ```text
//! Unbuilt ──build()──▶ Built ──add_adjust()──▶ Built
//!    ▲                   │
//!    └─────clear()───────┘
//! ```
//!
//! ## Construction
//!
//! Layers collapse left to right in pairs. When a layer has an odd number
//! of nodes the last one is promoted unpaired into the next layer; it is
//! never duplicated. For `a, b, c`:
//!
//! ```text
//!          root = h(h(a ++ b) ++ c)
//!         /                       \
//!   h(a ++ b)                      c
//!   /       \
//!  a         b
//! ```
//!
//! Under this policy the tree over `n` leaves is the right-folded list of
//! complete subtrees ("peaks"), one per set bit of `n`, largest first.
//! [`MerkleTree::add_adjust`] relies on that shape: appending a leaf is a
//! carry through the peaks, touching `O(log n)` nodes, and yields exactly
//! the tree `build` produces over the same `n + 1` leaves.
//!
//! For callers that only know the state at runtime, [`DynMerkleTree`]
//! enforces the same rules with [`TreeError::NotBuilt`].

use std::fmt;

use serde::{Deserialize, Serialize};

use mchain_core::{MerkleHasher, NodeDigest, TreeError};

use crate::chain::Chain;
use crate::node::{Arena, Node, NodeId, NodeRef};

// ─── State Types ─────────────────────────────────────────────────────

/// Tree state: leaves collected, layers not yet materialized.
#[derive(Debug, Clone, Copy)]
pub struct Unbuilt;

/// Tree state: layers materialized, root known.
#[derive(Debug, Clone, Copy)]
pub struct Built {
    root: NodeId,
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Unbuilt {}
    impl Sealed for super::Built {}
}

/// Marker trait for the two tree states.
///
/// Sealed: only [`Unbuilt`] and [`Built`] implement it.
pub trait TreeState: private::Sealed + fmt::Debug {
    /// The canonical state name (e.g., "BUILT").
    fn name() -> &'static str;
}

impl TreeState for Unbuilt {
    fn name() -> &'static str {
        "UNBUILT"
    }
}

impl TreeState for Built {
    fn name() -> &'static str {
        "BUILT"
    }
}

// ─── The Tree ────────────────────────────────────────────────────────

/// A binary hash tree over an ordered list of leaves, parameterized by its
/// lifecycle state.
///
/// Leaf order is significant: it fixes leaf indices and the tree's shape.
#[derive(Debug, Clone)]
pub struct MerkleTree<H: MerkleHasher, S: TreeState = Unbuilt> {
    hasher: H,
    arena: Arena,
    leaves: Vec<NodeId>,
    state: S,
}

impl<H: MerkleHasher, S: TreeState> MerkleTree<H, S> {
    /// Returns the canonical state name ("UNBUILT" or "BUILT").
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// The leaf at `index`, if any.
    pub fn leaf(&self, index: usize) -> Option<NodeRef<'_>> {
        self.leaves
            .get(index)
            .map(|&id| NodeRef::new(&self.arena, id))
    }

    /// All leaves, in order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.leaves.iter().map(|&id| NodeRef::new(&self.arena, id))
    }

    /// Number of nodes currently held, leaves included.
    pub fn node_count(&self) -> usize {
        self.arena.live()
    }
}

impl<H: MerkleHasher> MerkleTree<H, Unbuilt> {
    /// Create an empty tree that will hash with `hasher`.
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            arena: Arena::default(),
            leaves: Vec::new(),
            state: Unbuilt,
        }
    }

    /// Create a tree whose leaves are the digests of `items`.
    pub fn from_items<I, T>(hasher: H, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut tree = Self::new(hasher);
        tree.extend(items);
        tree
    }

    /// Create a tree whose leaves are the given digests, taken verbatim.
    pub fn from_digests<I: IntoIterator<Item = NodeDigest>>(hasher: H, digests: I) -> Self {
        let mut tree = Self::new(hasher);
        for digest in digests {
            tree.add_prehashed(digest);
        }
        tree
    }

    /// Append a leaf holding `digest(item)`. Returns the leaf's index.
    pub fn add(&mut self, item: impl AsRef<[u8]>) -> usize {
        let value = self.hasher.digest(item.as_ref());
        self.push_leaf(value)
    }

    /// Append a leaf holding `digest` verbatim, bypassing the hasher.
    /// Returns the leaf's index.
    pub fn add_prehashed(&mut self, digest: NodeDigest) -> usize {
        self.push_leaf(digest)
    }

    /// Append one leaf per item.
    pub fn extend<I, T>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for item in items {
            self.add(item);
        }
    }

    fn push_leaf(&mut self, value: NodeDigest) -> usize {
        let id = self.arena.insert(Node::leaf(value));
        self.leaves.push(id);
        self.leaves.len() - 1
    }

    /// Materialize every layer and link all nodes (UNBUILT → BUILT).
    ///
    /// Fails with [`TreeError::EmptyTree`] when there are no leaves.
    pub fn build(self) -> Result<MerkleTree<H, Built>, TreeError> {
        if self.leaves.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        let MerkleTree {
            hasher,
            mut arena,
            leaves,
            ..
        } = self;

        let mut layer = leaves.clone();
        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            let mut pairs = layer.chunks_exact(2);
            for pair in &mut pairs {
                next.push(arena.join(&hasher, pair[0], pair[1]));
            }
            // An odd node out is promoted as is.
            next.extend_from_slice(pairs.remainder());
            layer = next;
        }

        let tree = MerkleTree {
            hasher,
            arena,
            leaves,
            state: Built { root: layer[0] },
        };
        tracing::debug!(
            leaf_count = tree.leaf_count(),
            height = tree.height(),
            root = %tree.root(),
            "built merkle tree"
        );
        Ok(tree)
    }
}

impl<H: MerkleHasher> MerkleTree<H, Built> {
    /// The root digest.
    pub fn root(&self) -> &NodeDigest {
        &self.arena.get(self.state.root).value
    }

    pub fn root_node(&self) -> NodeRef<'_> {
        NodeRef::new(&self.arena, self.state.root)
    }

    /// Depth of the deepest leaf. A one-leaf tree has height 0.
    pub fn height(&self) -> u32 {
        let n = self.leaves.len();
        usize::BITS - (n - 1).leading_zeros()
    }

    /// The inclusion chain for the leaf at `index`.
    pub fn get_chain(&self, index: usize) -> Result<Chain, TreeError> {
        let leaf = self
            .leaf(index)
            .ok_or(TreeError::LeafIndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            })?;
        let chain = leaf.chain();
        tracing::trace!(index, len = chain.len(), "extracted chain");
        Ok(chain)
    }

    /// Inclusion chains for every leaf, in leaf order.
    pub fn chains(&self) -> impl Iterator<Item = Chain> + '_ {
        self.leaves().map(|leaf| leaf.chain())
    }

    /// Extend the tree by one leaf holding `digest(item)` without
    /// rebuilding it. Returns the new leaf's index.
    pub fn add_adjust(&mut self, item: impl AsRef<[u8]>) -> usize {
        let value = self.hasher.digest(item.as_ref());
        self.adjust(value)
    }

    /// Extend the tree by one leaf holding `digest` verbatim.
    pub fn add_adjust_prehashed(&mut self, digest: NodeDigest) -> usize {
        self.adjust(digest)
    }

    fn adjust(&mut self, value: NodeDigest) -> usize {
        // Peel the peaks off the right spine, largest first. A node whose
        // span is not a power of two is a spine node: its left child is a
        // peak and the rest of the peaks hang below its right child.
        let mut peaks = Vec::new();
        let mut spine = Vec::new();
        let mut node = self.state.root;
        let mut span = self.leaves.len();
        while !span.is_power_of_two() {
            let Some((left, right)) = self.arena.get(node).children else {
                break;
            };
            peaks.push(left);
            spine.push(node);
            span -= 1 << span.ilog2();
            node = right;
        }
        peaks.push(node);

        // Every spine node is replaced below, and every peak is re-parented.
        for id in spine {
            self.arena.release(id);
        }

        let leaf = self.arena.insert(Node::leaf(value));
        self.leaves.push(leaf);
        let mut carry = leaf;
        for peak in peaks.into_iter().rev() {
            carry = self.arena.join(&self.hasher, peak, carry);
        }
        self.state.root = carry;

        tracing::debug!(
            leaf_count = self.leaf_count(),
            root = %self.root(),
            "extended merkle tree"
        );
        self.leaves.len() - 1
    }

    /// Drop every internal node and detach the leaves (BUILT → UNBUILT).
    ///
    /// Leaf values and order survive, so the tree can be added to and
    /// rebuilt.
    pub fn clear(self) -> MerkleTree<H, Unbuilt> {
        let mut arena = Arena::with_capacity(self.leaves.len());
        let leaves = self
            .leaves
            .iter()
            .map(|&id| arena.insert(Node::leaf(self.arena.get(id).value.clone())))
            .collect();
        tracing::debug!(leaf_count = self.leaf_count(), "cleared merkle tree");
        MerkleTree {
            hasher: self.hasher,
            arena,
            leaves,
            state: Unbuilt,
        }
    }
}

/// Trees of the same hasher type are equal when their roots are.
impl<H: MerkleHasher> PartialEq for MerkleTree<H, Built> {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

impl<H: MerkleHasher> Eq for MerkleTree<H, Built> {}

// ─── DynMerkleTree — Runtime State ──────────────────────────────────

/// Runtime representation of the tree state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DynTreeState {
    /// Leaves collected, not built.
    Unbuilt,
    /// Built; the root is known.
    Built,
}

impl DynTreeState {
    /// Returns the canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unbuilt => "UNBUILT",
            Self::Built => "BUILT",
        }
    }
}

impl fmt::Display for DynTreeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tree whose state is only known at runtime.
///
/// Mirrors the typestate API with runtime checks: [`root`](Self::root),
/// [`get_chain`](Self::get_chain), and [`add_adjust`](Self::add_adjust)
/// return [`TreeError::NotBuilt`] before a successful build, and
/// [`add`](Self::add) on a built tree clears it first, since appending
/// invalidates the root.
///
/// Prefer `MerkleTree<H, Unbuilt>` / `MerkleTree<H, Built>` when the
/// state is known statically.
#[derive(Debug, Clone)]
pub enum DynMerkleTree<H: MerkleHasher> {
    Unbuilt(MerkleTree<H, Unbuilt>),
    Built(MerkleTree<H, Built>),
}

impl<H: MerkleHasher + Clone> DynMerkleTree<H> {
    pub fn new(hasher: H) -> Self {
        Self::Unbuilt(MerkleTree::new(hasher))
    }

    pub fn state(&self) -> DynTreeState {
        match self {
            Self::Unbuilt(_) => DynTreeState::Unbuilt,
            Self::Built(_) => DynTreeState::Built,
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Unbuilt(tree) => tree.leaf_count(),
            Self::Built(tree) => tree.leaf_count(),
        }
    }

    fn hasher(&self) -> &H {
        match self {
            Self::Unbuilt(tree) => tree.hasher(),
            Self::Built(tree) => tree.hasher(),
        }
    }

    /// Move the current tree out, leaving an empty unbuilt placeholder.
    fn take(&mut self) -> Self {
        let placeholder = Self::new(self.hasher().clone());
        std::mem::replace(self, placeholder)
    }

    /// Move the current tree out as an unbuilt tree, clearing it if built.
    fn take_unbuilt(&mut self) -> MerkleTree<H, Unbuilt> {
        match self.take() {
            Self::Unbuilt(tree) => tree,
            Self::Built(tree) => tree.clear(),
        }
    }

    /// Return to the unbuilt state, keeping the leaves.
    pub fn clear(&mut self) {
        let tree = self.take_unbuilt();
        *self = Self::Unbuilt(tree);
    }

    /// Append a leaf holding `digest(item)`, clearing a built tree first.
    pub fn add(&mut self, item: impl AsRef<[u8]>) -> usize {
        let mut tree = self.take_unbuilt();
        let index = tree.add(item);
        *self = Self::Unbuilt(tree);
        index
    }

    /// Append a prehashed leaf, clearing a built tree first.
    pub fn add_prehashed(&mut self, digest: NodeDigest) -> usize {
        let mut tree = self.take_unbuilt();
        let index = tree.add_prehashed(digest);
        *self = Self::Unbuilt(tree);
        index
    }

    /// Build the tree and return its root. Building a tree that is already
    /// built returns the existing root.
    pub fn build(&mut self) -> Result<NodeDigest, TreeError> {
        match self.take() {
            Self::Unbuilt(tree) => {
                let built = tree.build()?;
                let root = built.root().clone();
                *self = Self::Built(built);
                Ok(root)
            }
            Self::Built(tree) => {
                let root = tree.root().clone();
                *self = Self::Built(tree);
                Ok(root)
            }
        }
    }

    pub fn root(&self) -> Result<&NodeDigest, TreeError> {
        self.built().map(|tree| tree.root())
    }

    pub fn get_chain(&self, index: usize) -> Result<Chain, TreeError> {
        self.built()?.get_chain(index)
    }

    /// Extend a built tree by one leaf. See [`MerkleTree::add_adjust`].
    pub fn add_adjust(&mut self, item: impl AsRef<[u8]>) -> Result<usize, TreeError> {
        match self {
            Self::Built(tree) => Ok(tree.add_adjust(item)),
            Self::Unbuilt(_) => Err(TreeError::NotBuilt),
        }
    }

    /// Extend a built tree by one leaf with a verbatim digest. See
    /// [`MerkleTree::add_adjust_prehashed`].
    pub fn add_adjust_prehashed(&mut self, digest: NodeDigest) -> Result<usize, TreeError> {
        match self {
            Self::Built(tree) => Ok(tree.add_adjust_prehashed(digest)),
            Self::Unbuilt(_) => Err(TreeError::NotBuilt),
        }
    }

    /// The typed built tree, if built.
    pub fn built(&self) -> Result<&MerkleTree<H, Built>, TreeError> {
        match self {
            Self::Built(tree) => Ok(tree),
            Self::Unbuilt(_) => Err(TreeError::NotBuilt),
        }
    }
}
