//! # Inclusion Chains
//!
//! A [`Chain`] is the path from one leaf to its tree's root, as an ordered
//! list of `(digest, role)` links:
//!
//! ```text
//! [ (leaf, SELF)  (sibling₀, LEFT|RIGHT)  …  (siblingₖ, LEFT|RIGHT)  (root, ROOT) ]
//! ```
//!
//! Chains are plain values with no reference back into a tree.
//! [`check_chain`] recomputes the root from the leaf and the sibling
//! digests alone, so a remote party holding only a chain and a trusted
//! root digest can verify inclusion. [`join_chains`] splices a chain
//! through a sub-tree into a chain through the tree that holds the
//! sub-tree's root as a leaf.
//!
//! ## Verification Rule
//!
//! Starting from the SELF digest, each intermediate link folds into the
//! running digest on the side its role names:
//!
//! - `RIGHT`: `link = digest(link ++ sibling)`
//! - `LEFT`:  `link = digest(sibling ++ link)`
//!
//! The chain verifies when the final digest equals the ROOT link.

use std::fmt;

use serde::{Deserialize, Serialize};

use mchain_core::{ChainError, MerkleHasher, NodeDigest};

use crate::node::Side;

/// Role of a link within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The leaf being proven. First link only.
    #[serde(rename = "SELF")]
    Origin,
    /// A sibling sitting to the left of the running digest.
    #[serde(rename = "LEFT", alias = "L")]
    Left,
    /// A sibling sitting to the right of the running digest.
    #[serde(rename = "RIGHT", alias = "R")]
    Right,
    /// The root of the tree. Last link only.
    #[serde(rename = "ROOT")]
    Root,
}

impl Role {
    /// Returns the external role tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Origin => "SELF",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Root => "ROOT",
        }
    }

    /// Parse an external role tag. Accepts the short forms `L` and `R`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "SELF" => Some(Self::Origin),
            "LEFT" | "L" => Some(Self::Left),
            "RIGHT" | "R" => Some(Self::Right),
            "ROOT" => Some(Self::Root),
            _ => None,
        }
    }

    /// The sibling side this role denotes, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::Left => Some(Side::Left),
            Self::Right => Some(Side::Right),
            Self::Origin | Self::Root => None,
        }
    }
}

impl From<Side> for Role {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Self::Left,
            Side::Right => Self::Right,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(digest, role)` entry of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainLink {
    pub digest: NodeDigest,
    pub role: Role,
}

impl ChainLink {
    pub fn new(digest: NodeDigest, role: Role) -> Self {
        Self { digest, role }
    }
}

/// An inclusion proof from a leaf to a root.
///
/// Construction does not validate the link roles; [`check_chain`] does.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain {
    links: Vec<ChainLink>,
}

impl Chain {
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Mutable access to the links, for building altered chains.
    pub fn links_mut(&mut self) -> &mut [ChainLink] {
        &mut self.links
    }

    pub fn into_links(self) -> Vec<ChainLink> {
        self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChainLink> {
        self.links.iter()
    }

    /// Digest of the first link (the leaf being proven).
    pub fn leaf(&self) -> Option<&NodeDigest> {
        self.links.first().map(|link| &link.digest)
    }

    /// Digest of the last link (the claimed root).
    pub fn root(&self) -> Option<&NodeDigest> {
        self.links.last().map(|link| &link.digest)
    }

    /// Verify this chain. See [`check_chain`].
    pub fn verify<H: MerkleHasher>(&self, hasher: &H) -> Result<NodeDigest, ChainError> {
        check_chain(self, hasher)
    }

    /// Splice this chain beneath `high`. See [`join_chains`].
    pub fn join(&self, high: &Chain) -> Result<Chain, ChainError> {
        join_chains(self, high)
    }
}

impl FromIterator<ChainLink> for Chain {
    fn from_iter<I: IntoIterator<Item = ChainLink>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a ChainLink;
    type IntoIter = std::slice::Iter<'a, ChainLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

fn malformed(index: usize, link: &ChainLink) -> ChainError {
    ChainError::Malformed {
        index,
        digest: link.digest.clone(),
        role: link.role.as_str().to_string(),
    }
}

/// Recompute the root digest from a chain and compare it with the chain's
/// ROOT link.
///
/// Returns the verified root. Fails with:
///
/// - [`ChainError::Truncated`] when the chain has fewer than two links,
/// - [`ChainError::Malformed`] when the first link is not `SELF`, the last
///   is not `ROOT`, or an intermediate link is not `LEFT`/`RIGHT`,
/// - [`ChainError::Mismatch`] when the recomputed root differs from the
///   claimed one. This is the ordinary "proof rejected" answer.
pub fn check_chain<H: MerkleHasher>(chain: &Chain, hasher: &H) -> Result<NodeDigest, ChainError> {
    let links = chain.links();
    let (first, last) = match links {
        [first, .., last] => (first, last),
        _ => return Err(ChainError::Truncated { len: links.len() }),
    };
    if first.role != Role::Origin {
        return Err(malformed(0, first));
    }
    if last.role != Role::Root {
        return Err(malformed(links.len() - 1, last));
    }

    let mut running = first.digest.clone();
    for (index, link) in links.iter().enumerate().take(links.len() - 1).skip(1) {
        running = match link.role {
            Role::Right => hasher.combine(&running, &link.digest),
            Role::Left => hasher.combine(&link.digest, &running),
            Role::Origin | Role::Root => return Err(malformed(index, link)),
        };
    }

    if running == last.digest {
        tracing::trace!(len = links.len(), root = %running, "chain verified");
        Ok(running)
    } else {
        tracing::debug!(
            len = links.len(),
            computed = %running,
            claimed = %last.digest,
            "chain rejected"
        );
        Err(ChainError::Mismatch {
            computed: running,
            claimed: last.digest.clone(),
        })
    }
}

/// Splice a chain through a sub-tree (`low`) into a chain through the tree
/// that holds the sub-tree's root as a leaf (`high`).
///
/// The result is `low[..-1] ++ high[1..]`: the low ROOT link and the high
/// SELF link, which carry the same digest, are both dropped. It proves the
/// low leaf against the high tree's root and verifies with
/// [`check_chain`] unchanged.
pub fn join_chains(low: &Chain, high: &Chain) -> Result<Chain, ChainError> {
    for chain in [low, high] {
        if chain.len() < 2 {
            return Err(ChainError::Truncated { len: chain.len() });
        }
    }
    let low_links = low.links();
    let high_links = high.links();
    let low_root = &low_links[low_links.len() - 1];
    let high_leaf = &high_links[0];
    if low_root.digest != high_leaf.digest {
        return Err(ChainError::DoNotConnect {
            low_root: low_root.digest.clone(),
            high_leaf: high_leaf.digest.clone(),
        });
    }

    let joined: Chain = low_links[..low_links.len() - 1]
        .iter()
        .chain(&high_links[1..])
        .cloned()
        .collect();
    tracing::debug!(
        low_len = low.len(),
        high_len = high.len(),
        len = joined.len(),
        "joined chains"
    );
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mchain_core::DigestAlgorithm;

    const ALG: DigestAlgorithm = DigestAlgorithm::Sha256;

    fn d(item: &str) -> NodeDigest {
        ALG.digest(item.as_bytes())
    }

    /// Chain for leaf `a` of the tree over `a, b`.
    fn two_leaf_chain() -> Chain {
        Chain::new(vec![
            ChainLink::new(d("a"), Role::Origin),
            ChainLink::new(d("b"), Role::Right),
            ChainLink::new(ALG.combine(&d("a"), &d("b")), Role::Root),
        ])
    }

    #[test]
    fn test_check_chain_returns_root() {
        let chain = two_leaf_chain();
        let root = check_chain(&chain, &ALG).unwrap();
        assert_eq!(
            root.to_hex(),
            "e5a01fee14e0ed5c48714f22180f25ad8365b53f9779f79dc4a3d7e93963f94a"
        );
        assert_eq!(chain.verify(&ALG).unwrap(), root);
    }

    #[test]
    fn test_left_sibling_folds_on_the_left() {
        let chain = Chain::new(vec![
            ChainLink::new(d("b"), Role::Origin),
            ChainLink::new(d("a"), Role::Left),
            ChainLink::new(ALG.combine(&d("a"), &d("b")), Role::Root),
        ]);
        assert!(check_chain(&chain, &ALG).is_ok());
    }

    #[test]
    fn test_swapped_side_is_mismatch() {
        let mut chain = two_leaf_chain();
        chain.links_mut()[1].role = Role::Left;
        let err = check_chain(&chain, &ALG).unwrap_err();
        assert!(matches!(err, ChainError::Mismatch { .. }));
    }

    #[test]
    fn test_intermediate_root_role_is_malformed() {
        let mut chain = two_leaf_chain();
        chain.links_mut()[1].role = Role::Root;
        let err = check_chain(&chain, &ALG).unwrap_err();
        assert_eq!(
            err,
            ChainError::Malformed {
                index: 1,
                digest: d("b"),
                role: "ROOT".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_framing_is_malformed() {
        let mut chain = two_leaf_chain();
        chain.links_mut()[0].role = Role::Right;
        assert!(matches!(
            check_chain(&chain, &ALG),
            Err(ChainError::Malformed { index: 0, .. })
        ));

        let mut chain = two_leaf_chain();
        chain.links_mut()[2].role = Role::Left;
        assert!(matches!(
            check_chain(&chain, &ALG),
            Err(ChainError::Malformed { index: 2, .. })
        ));
    }

    #[test]
    fn test_truncated_chains() {
        assert_eq!(
            check_chain(&Chain::default(), &ALG),
            Err(ChainError::Truncated { len: 0 })
        );
        let single: Chain = std::iter::once(ChainLink::new(d("a"), Role::Origin)).collect();
        assert_eq!(
            check_chain(&single, &ALG),
            Err(ChainError::Truncated { len: 1 })
        );
    }

    #[test]
    fn test_degenerate_chain_verifies() {
        let chain = Chain::new(vec![
            ChainLink::new(d("a"), Role::Origin),
            ChainLink::new(d("a"), Role::Root),
        ]);
        assert_eq!(check_chain(&chain, &ALG).unwrap(), d("a"));
    }

    #[test]
    fn test_join_drops_boundary_links() {
        let low = two_leaf_chain();
        let low_root = low.root().unwrap().clone();
        let high = Chain::new(vec![
            ChainLink::new(low_root.clone(), Role::Origin),
            ChainLink::new(d("c"), Role::Right),
            ChainLink::new(ALG.combine(&low_root, &d("c")), Role::Root),
        ]);

        let joined = join_chains(&low, &high).unwrap();
        assert_eq!(joined.len(), low.len() + high.len() - 2);
        assert_eq!(joined.leaf(), Some(&d("a")));
        assert_eq!(joined.root(), high.root());
        assert_eq!(&check_chain(&joined, &ALG).unwrap(), high.root().unwrap());
        assert_eq!(low.join(&high).unwrap(), joined);
    }

    #[test]
    fn test_join_rejects_disconnected_chains() {
        let low = two_leaf_chain();
        let high = Chain::new(vec![
            ChainLink::new(d("x"), Role::Origin),
            ChainLink::new(d("x"), Role::Root),
        ]);
        let err = join_chains(&low, &high).unwrap_err();
        assert_eq!(
            err,
            ChainError::DoNotConnect {
                low_root: low.root().unwrap().clone(),
                high_leaf: d("x"),
            }
        );
    }

    #[test]
    fn test_join_rejects_truncated_input() {
        let low = two_leaf_chain();
        assert_eq!(
            join_chains(&low, &Chain::default()),
            Err(ChainError::Truncated { len: 0 })
        );
    }

    #[test]
    fn test_role_serde_tags() {
        assert_eq!(serde_json::to_string(&Role::Origin).unwrap(), "\"SELF\"");
        assert_eq!(serde_json::to_string(&Role::Left).unwrap(), "\"LEFT\"");
        assert_eq!(serde_json::from_str::<Role>("\"R\"").unwrap(), Role::Right);
        assert_eq!(serde_json::from_str::<Role>("\"L\"").unwrap(), Role::Left);
        assert!(serde_json::from_str::<Role>("\"UP\"").is_err());
    }

    #[test]
    fn test_role_side_conversion() {
        assert_eq!(Role::from(Side::Left), Role::Left);
        assert_eq!(Role::Right.side(), Some(Side::Right));
        assert_eq!(Role::Origin.side(), None);
        assert_eq!(Role::Root.to_string(), "ROOT");
    }

    #[test]
    fn test_role_from_tag_matches_serde_names() {
        for role in [Role::Origin, Role::Left, Role::Right, Role::Root] {
            assert_eq!(Role::from_tag(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_tag("L"), Some(Role::Left));
        assert_eq!(Role::from_tag("R"), Some(Role::Right));
        assert_eq!(Role::from_tag("right"), None);
        assert_eq!(Role::from_tag("X"), None);
    }
}
