//! # mchain-tree — Binary Hash Trees and Inclusion Chains
//!
//! Builds a binary hash tree over an ordered list of items, extracts the
//! leaf-to-root inclusion chain for any leaf, and verifies such a chain
//! with nothing but the chain and a hash function.
//!
//! ## Key Design Principles
//!
//! 1. **Typestate lifecycle.** `MerkleTree<H, Unbuilt>` collects leaves;
//!    `build()` consumes it and returns `MerkleTree<H, Built>`. Chains and
//!    roots only exist on the built type.
//!
//! 2. **Promote-unpaired shape.** An odd node out of a layer moves up
//!    unchanged. The resulting shape lets `add_adjust` extend a built tree
//!    in `O(log n)` and still match a full rebuild.
//!
//! 3. **Chains are self-contained.** A [`Chain`] holds digests and roles
//!    only. [`check_chain`] needs no tree, and [`join_chains`] composes
//!    proofs across trees whose leaves are other trees' roots.
//!
//! 4. **Hash agnostic.** Every operation goes through
//!    [`MerkleHasher`]; SHA-256 is the default, not a requirement.
//!
//! ## Crate Policy
//!
//! - Depends only on `mchain-core` internally.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod chain;
pub mod hex;
pub mod node;
pub mod tree;

pub use chain::{check_chain, join_chains, Chain, ChainLink, Role};
pub use hex::{check_hex_chain, check_hex_json, HexChain, HexLink};
pub use node::{NodeRef, Side};
pub use tree::{Built, DynMerkleTree, DynTreeState, MerkleTree, TreeState, Unbuilt};

// Re-export the core types every caller of this crate needs.
pub use mchain_core::{
    ChainError, DigestAlgorithm, EncodingError, MchainError, MerkleHasher, NodeDigest, TreeError,
};
