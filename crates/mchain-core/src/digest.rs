//! # Node Digests and the Hash Seam
//!
//! Defines `NodeDigest`, the raw digest bytes held by every tree node and
//! chain link, and `MerkleHasher`, the trait through which trees and
//! verifiers reach a hash function.
//!
//! ## Digest Rules
//!
//! - Leaf: `digest(item_bytes)`, unless the leaf is prehashed, in which case
//!   the caller's digest is stored verbatim.
//! - Internal node: `digest(left ++ right)`, byte concatenation, left first.
//!
//! A tree and the chains it produces are only comparable with another tree
//! or chain built through the same hasher.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::EncodingError;

/// Raw digest bytes of a tree node or chain link.
///
/// Variable length so that the tree is agnostic to the output size of the
/// hash function it was built with. Serializes as a lowercase hex string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeDigest(Vec<u8>);

impl NodeDigest {
    /// Wrap raw digest bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a hex-encoded digest. Case-insensitive; surrounding whitespace
    /// is ignored.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s.trim()).map(Self)
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for NodeDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for NodeDigest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for NodeDigest {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for NodeDigest {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for NodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for NodeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeDigest({})", self.to_hex())
    }
}

impl Serialize for NodeDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NodeDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A deterministic digest function over byte sequences.
///
/// Supplied once per tree or verification call. Implementations must map
/// equal inputs to equal outputs of a fixed length.
pub trait MerkleHasher {
    /// Digest of an arbitrary byte sequence.
    fn digest(&self, data: &[u8]) -> NodeDigest;

    /// Digest of an internal node: `digest(left ++ right)`.
    ///
    /// Implementations may override this to stream both halves into the
    /// hash state, but the result must equal the default.
    fn combine(&self, left: &NodeDigest, right: &NodeDigest) -> NodeDigest {
        let mut buf = Vec::with_capacity(left.len() + right.len());
        buf.extend_from_slice(left.as_bytes());
        buf.extend_from_slice(right.as_bytes());
        self.digest(&buf)
    }
}

impl<H: MerkleHasher + ?Sized> MerkleHasher for &H {
    fn digest(&self, data: &[u8]) -> NodeDigest {
        (**self).digest(data)
    }

    fn combine(&self, left: &NodeDigest, right: &NodeDigest) -> NodeDigest {
        (**self).combine(left, right)
    }
}

/// Built-in SHA-2 digest functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256, 32-byte digests.
    #[default]
    Sha256,
    /// SHA-384, 48-byte digests.
    Sha384,
    /// SHA-512, 64-byte digests.
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Length in bytes of the digests this algorithm produces.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Parse a hex digest that must be exactly [`output_len`](Self::output_len)
    /// bytes long.
    pub fn parse_digest(&self, s: &str) -> Result<NodeDigest, EncodingError> {
        let digest = NodeDigest::from_hex(s)?;
        if digest.len() != self.output_len() {
            return Err(EncodingError::DigestLength {
                algorithm: self.as_str(),
                expected: self.output_len(),
                found: digest.len(),
            });
        }
        Ok(digest)
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(EncodingError::UnknownAlgorithm(s.to_string())),
        }
    }
}

fn digest_with<D: Digest>(data: &[u8]) -> NodeDigest {
    NodeDigest(D::digest(data).to_vec())
}

fn combine_with<D: Digest>(left: &NodeDigest, right: &NodeDigest) -> NodeDigest {
    let out = D::new()
        .chain_update(left.as_bytes())
        .chain_update(right.as_bytes())
        .finalize();
    NodeDigest(out.to_vec())
}

impl MerkleHasher for DigestAlgorithm {
    fn digest(&self, data: &[u8]) -> NodeDigest {
        match self {
            Self::Sha256 => digest_with::<Sha256>(data),
            Self::Sha384 => digest_with::<Sha384>(data),
            Self::Sha512 => digest_with::<Sha512>(data),
        }
    }

    fn combine(&self, left: &NodeDigest, right: &NodeDigest) -> NodeDigest {
        match self {
            Self::Sha256 => combine_with::<Sha256>(left, right),
            Self::Sha384 => combine_with::<Sha384>(left, right),
            Self::Sha512 => combine_with::<Sha512>(left, right),
        }
    }
}
