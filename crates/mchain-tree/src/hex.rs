//! # Hex Chain Documents
//!
//! Text form of chains for storage and transport. Each link becomes a
//! two-element JSON array of lowercase hex digest and role tag:
//!
//! ```json
//! [["ca97…48bb", "SELF"], ["3e23…009d", "RIGHT"], ["bffe…3e5b", "RIGHT"], ["14ed…13e7", "ROOT"]]
//! ```
//!
//! Decoding accepts upper- or lowercase hex. Role tags are kept as written
//! until [`HexChain::to_chain`], so a document with an unknown tag parses
//! and is then rejected as [`ChainError::Malformed`] naming the link.
//! Converting a [`Chain`] to a [`HexChain`] and back yields the same chain.

use serde::{Deserialize, Serialize};

use mchain_core::{ChainError, EncodingError, MchainError, MerkleHasher, NodeDigest, TreeError};

use crate::chain::{check_chain, Chain, ChainLink, Role};
use crate::tree::{Built, MerkleTree, Unbuilt};

/// One chain link as `(hex digest, role tag)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexLink(pub String, pub String);

impl HexLink {
    pub fn new(digest: impl Into<String>, role: Role) -> Self {
        Self(digest.into(), role.as_str().to_string())
    }

    pub fn digest(&self) -> &str {
        &self.0
    }

    /// The role tag as written.
    pub fn tag(&self) -> &str {
        &self.1
    }

    /// The parsed role, or `None` for an unknown tag.
    pub fn role(&self) -> Option<Role> {
        Role::from_tag(&self.1)
    }
}

impl From<&ChainLink> for HexLink {
    fn from(link: &ChainLink) -> Self {
        Self::new(link.digest.to_hex(), link.role)
    }
}

/// A chain with hex-encoded digests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexChain(pub Vec<HexLink>);

impl HexChain {
    pub fn links(&self) -> &[HexLink] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode every link.
    ///
    /// Fails on the first link whose digest is not valid hex
    /// ([`EncodingError::InvalidLinkHex`]) or whose role tag is unknown
    /// ([`ChainError::Malformed`]).
    pub fn to_chain(&self) -> Result<Chain, MchainError> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, link)| -> Result<ChainLink, MchainError> {
                let digest = NodeDigest::from_hex(link.digest())
                    .map_err(|source| EncodingError::InvalidLinkHex { index, source })?;
                match link.role() {
                    Some(role) => Ok(ChainLink::new(digest, role)),
                    None => Err(ChainError::Malformed {
                        index,
                        digest,
                        role: link.tag().to_string(),
                    }
                    .into()),
                }
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, EncodingError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, EncodingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EncodingError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&Chain> for HexChain {
    fn from(chain: &Chain) -> Self {
        Self(chain.iter().map(HexLink::from).collect())
    }
}

impl FromIterator<HexLink> for HexChain {
    fn from_iter<I: IntoIterator<Item = HexLink>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Chain {
    /// Hex form of this chain.
    pub fn to_hex(&self) -> HexChain {
        HexChain::from(self)
    }
}

/// Decode and verify a hex chain, returning the verified root as lowercase
/// hex.
pub fn check_hex_chain<H: MerkleHasher>(
    chain: &HexChain,
    hasher: &H,
) -> Result<String, MchainError> {
    let chain = chain.to_chain()?;
    let root = check_chain(&chain, hasher)?;
    Ok(root.to_hex())
}

/// Parse a hex chain document and verify it. See [`check_hex_chain`].
pub fn check_hex_json<H: MerkleHasher>(json: &str, hasher: &H) -> Result<String, MchainError> {
    check_hex_chain(&HexChain::from_json(json)?, hasher)
}

impl<H: MerkleHasher> MerkleTree<H, Built> {
    /// The inclusion chain for leaf `index`, hex-encoded.
    pub fn get_hex_chain(&self, index: usize) -> Result<HexChain, TreeError> {
        self.get_chain(index).map(|chain| chain.to_hex())
    }

    pub fn root_hex(&self) -> String {
        self.root().to_hex()
    }
}

impl<H: MerkleHasher> MerkleTree<H, Unbuilt> {
    /// Append a leaf whose value is the hex-encoded digest `hex`, taken
    /// verbatim. Returns the leaf's index.
    pub fn add_hex_prehashed(&mut self, hex: &str) -> Result<usize, EncodingError> {
        let digest = NodeDigest::from_hex(hex)?;
        Ok(self.add_prehashed(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mchain_core::DigestAlgorithm;

    const ALG: DigestAlgorithm = DigestAlgorithm::Sha256;

    fn abcd() -> MerkleTree<DigestAlgorithm, Built> {
        MerkleTree::from_items(ALG, ["a", "b", "c", "d"]).build().unwrap()
    }

    #[test]
    fn test_hex_link_is_a_json_pair() {
        let link = HexLink::new("ab01", Role::Origin);
        assert_eq!(serde_json::to_string(&link).unwrap(), r#"["ab01","SELF"]"#);
        let back: HexLink = serde_json::from_str(r#"["AB01","R"]"#).unwrap();
        assert_eq!(back.digest(), "AB01");
        assert_eq!(back.tag(), "R");
        assert_eq!(back.role(), Some(Role::Right));
    }

    #[test]
    fn test_get_hex_chain_for_first_leaf() {
        let chain = abcd().get_hex_chain(0).unwrap();
        let expected = HexChain(vec![
            HexLink::new(
                "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb",
                Role::Origin,
            ),
            HexLink::new(
                "3e23e8160039594a33894f6564e1b1348bbd7a0088d42c4acb73eeaed59c009d",
                Role::Right,
            ),
            HexLink::new(
                "bffe0b34dba16bc6fac17c08bac55d676cded5a4ade41fe2c9924a5dde8f3e5b",
                Role::Right,
            ),
            HexLink::new(
                "14ede5e8e97ad9372327728f5099b95604a39593cac3bd38a343ad76205213e7",
                Role::Root,
            ),
        ]);
        assert_eq!(chain, expected);
    }

    #[test]
    fn test_check_hex_chain_returns_root_hex() {
        let tree = abcd();
        for i in 0..4 {
            let chain = tree.get_hex_chain(i).unwrap();
            assert_eq!(check_hex_chain(&chain, &ALG).unwrap(), tree.root_hex());
        }
    }

    #[test]
    fn test_json_round_trip() {
        let tree = abcd();
        let hex = tree.get_hex_chain(2).unwrap();
        let json = hex.to_json().unwrap();
        assert!(json.starts_with("[[\""));
        assert_eq!(HexChain::from_json(&json).unwrap(), hex);
        assert_eq!(hex.to_chain().unwrap(), tree.get_chain(2).unwrap());
        assert_eq!(
            check_hex_json(&hex.to_json_pretty().unwrap(), &ALG).unwrap(),
            tree.root_hex()
        );
    }

    #[test]
    fn test_bad_link_hex_names_index() {
        let mut hex = abcd().get_hex_chain(0).unwrap();
        hex.0[2].0 = "not hex".to_string();
        let err = hex.to_chain().unwrap_err();
        assert!(matches!(
            err,
            MchainError::Encoding(EncodingError::InvalidLinkHex { index: 2, .. })
        ));
        assert!(matches!(
            check_hex_chain(&hex, &ALG),
            Err(MchainError::Encoding(EncodingError::InvalidLinkHex { index: 2, .. }))
        ));
    }

    #[test]
    fn test_rejection_surfaces_as_chain_error() {
        let mut hex = abcd().get_hex_chain(1).unwrap();
        hex.0.swap(1, 2);
        assert!(matches!(
            check_hex_chain(&hex, &ALG),
            Err(MchainError::Chain(ChainError::Mismatch { .. }))
        ));
    }

    #[test]
    fn test_unknown_role_tag_is_malformed() {
        let json = abcd().get_hex_chain(0).unwrap().to_json().unwrap();
        let json = json.replacen("RIGHT", "X", 1);
        let hex = HexChain::from_json(&json).unwrap();
        assert_eq!(hex.links()[1].tag(), "X");
        assert_eq!(hex.links()[1].role(), None);

        let MchainError::Chain(err) = hex.to_chain().unwrap_err() else {
            panic!("expected a chain error");
        };
        assert_eq!(
            err,
            ChainError::Malformed {
                index: 1,
                digest: NodeDigest::from_hex(hex.links()[1].digest()).unwrap(),
                role: "X".to_string(),
            }
        );
        assert!(matches!(
            check_hex_json(&json, &ALG),
            Err(MchainError::Chain(ChainError::Malformed { index: 1, .. }))
        ));

        let first = abcd().get_hex_chain(0).unwrap().to_json().unwrap().replacen("SELF", "X", 1);
        assert!(matches!(
            check_hex_json(&first, &ALG),
            Err(MchainError::Chain(ChainError::Malformed { index: 0, .. }))
        ));
    }

    #[test]
    fn test_bad_hex_is_reported_before_bad_tag() {
        let hex = HexChain(vec![HexLink("zz".to_string(), "X".to_string())]);
        assert!(matches!(
            hex.to_chain(),
            Err(MchainError::Encoding(EncodingError::InvalidLinkHex { index: 0, .. }))
        ));
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        assert!(matches!(
            HexChain::from_json(r#"[["ab", 7]]"#),
            Err(EncodingError::Json(_))
        ));
        assert!(matches!(
            HexChain::from_json(r#"[["ab"]]"#),
            Err(EncodingError::Json(_))
        ));
        assert!(HexChain::from_json(r#"{"links": []}"#).is_err());
    }

    #[test]
    fn test_add_hex_prehashed() {
        let mut tree = MerkleTree::new(ALG);
        for hex in [
            "CA978112CA1BBDCAFAC231B39A23DC4DA786EFF8147C4E72B9807785AFEE48BB",
            "3e23e8160039594a33894f6564e1b1348bbd7a0088d42c4acb73eeaed59c009d",
        ] {
            tree.add_hex_prehashed(hex).unwrap();
        }
        assert!(matches!(
            tree.add_hex_prehashed("xyz"),
            Err(EncodingError::InvalidHex(_))
        ));
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(
            tree.build().unwrap().root_hex(),
            "e5a01fee14e0ed5c48714f22180f25ad8365b53f9779f79dc4a3d7e93963f94a"
        );
    }
}
