//! # mchain-core — Foundational Types for mchain
//!
//! This crate is the leaf of the mchain workspace. It defines the digest
//! value type every other crate passes around, the single abstraction
//! through which a hash function is invoked, and the error hierarchy.
//!
//! ## Key Design Principles
//!
//! 1. **`NodeDigest` newtype.** Node values, chain links, and roots are all
//!    `NodeDigest`. No bare `Vec<u8>` crosses a crate boundary.
//!
//! 2. **`MerkleHasher` is the only hash seam.** Trees and verifiers are
//!    generic over it and never name a concrete algorithm. The internal-node
//!    rule `digest(left ++ right)` is fixed here, in `MerkleHasher::combine`.
//!
//! 3. **`DigestAlgorithm` for the SHA-2 family.** SHA-256 is the default and
//!    reproduces the reference vectors; SHA-384 and SHA-512 are available
//!    for trees that want wider digests.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mchain-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;

// Re-export primary types for ergonomic imports.
pub use digest::{DigestAlgorithm, MerkleHasher, NodeDigest};
pub use error::{ChainError, EncodingError, MchainError, TreeError};
