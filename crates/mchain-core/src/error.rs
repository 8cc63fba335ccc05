//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout mchain. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every error is a local, caller-recoverable condition. Nothing is
//!   retried internally.
//! - `ChainError::Mismatch` is the ordinary "proof rejected" answer and is
//!   kept distinct from `ChainError::Malformed`, which signals a chain that
//!   could not have come from any tree.
//! - Chain errors carry the offending link index and digest.

use thiserror::Error;

use crate::digest::NodeDigest;

/// Top-level error type for mchain.
#[derive(Error, Debug)]
pub enum MchainError {
    /// Tree lifecycle or lookup failure.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Chain verification or composition failure.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Text encoding failure at the hex/JSON boundary.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

/// Error in tree construction or chain extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// `build` called on a tree with no leaves.
    #[error("tree has no leaves")]
    EmptyTree,

    /// A chain, root, or extension was requested before a successful build.
    #[error("tree has not been built")]
    NotBuilt,

    /// A chain was requested for a leaf that does not exist.
    #[error("leaf index {index} out of range for a tree of {leaf_count} leaves")]
    LeafIndexOutOfRange {
        /// The requested leaf index.
        index: usize,
        /// Number of leaves in the tree.
        leaf_count: usize,
    },
}

/// Error in chain verification or composition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A link carries a role that is not allowed at its position.
    #[error("malformed chain: link {index} ({digest}) has role {role}")]
    Malformed {
        /// Position of the offending link.
        index: usize,
        /// Digest of the offending link.
        digest: NodeDigest,
        /// Role tag found on the link, as written.
        role: String,
    },

    /// The recomputed root differs from the root the chain claims.
    #[error("chain does not verify: computed root {computed}, claimed root {claimed}")]
    Mismatch {
        /// Root recomputed from the leaf and its siblings.
        computed: NodeDigest,
        /// Digest of the chain's ROOT link.
        claimed: NodeDigest,
    },

    /// The low chain's root is not the high chain's leaf.
    #[error("chains do not connect: low root {low_root}, high leaf {high_leaf}")]
    DoNotConnect {
        /// Digest of the low chain's ROOT link.
        low_root: NodeDigest,
        /// Digest of the high chain's SELF link.
        high_leaf: NodeDigest,
    },

    /// The chain lacks the SELF and ROOT links.
    #[error("chain has {len} links; at least SELF and ROOT are required")]
    Truncated {
        /// Number of links found.
        len: usize,
    },
}

/// Error at the text boundary (hex digests, JSON chain documents).
#[derive(Error, Debug)]
pub enum EncodingError {
    /// A chain link's digest is not valid hex.
    #[error("link {index} is not valid hex: {source}")]
    InvalidLinkHex {
        /// Position of the offending link.
        index: usize,
        /// Underlying decode failure.
        source: hex::FromHexError,
    },

    /// A standalone digest is not valid hex.
    #[error("invalid hex digest: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// A chain document is not valid JSON or has the wrong shape.
    #[error("invalid chain document: {0}")]
    Json(#[from] serde_json::Error),

    /// A digest whose length does not match the tree's algorithm.
    #[error("digest is {found} bytes; {algorithm} digests are {expected} bytes")]
    DigestLength {
        /// Name of the algorithm the digest was checked against.
        algorithm: &'static str,
        /// Output length of that algorithm.
        expected: usize,
        /// Length of the decoded digest.
        found: usize,
    },

    /// An unsupported digest algorithm name.
    #[error("unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),
}
