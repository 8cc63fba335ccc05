//! # Join Subcommand
//!
//! Splices a chain through a sub-tree (LOW) into a chain through the tree
//! holding the sub-tree's root as a leaf (HIGH). The joined chain proves
//! the sub-tree item against HIGH's root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mchain_tree::{join_chains, Chain, HexChain};

use crate::input::read_source;
use crate::Report;

/// Arguments for `mchain join`.
#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Chain through the sub-tree.
    #[arg(value_name = "LOW_JSON")]
    pub low: PathBuf,

    /// Chain through the tree whose leaf is the sub-tree's root.
    #[arg(value_name = "HIGH_JSON")]
    pub high: PathBuf,

    /// Pretty-print the joined chain JSON.
    #[arg(long)]
    pub pretty: bool,
}

fn read_chain(json: &str) -> Result<Chain> {
    Ok(HexChain::from_json(json)?.to_chain()?)
}

/// Execute `mchain join`.
pub fn run_join(args: &JoinArgs) -> Result<u8> {
    let low = read_source(&args.low)?;
    let high = read_source(&args.high)?;
    Ok(join_report(&low, &high, args.pretty)?.emit())
}

pub fn join_report(low_json: &str, high_json: &str, pretty: bool) -> Result<Report> {
    let low = read_chain(low_json).context("failed to read low chain")?;
    let high = read_chain(high_json).context("failed to read high chain")?;

    let joined = join_chains(&low, &high)?.to_hex();
    let json = if pretty {
        joined.to_json_pretty()
    } else {
        joined.to_json()
    }
    .context("failed to encode chain")?;
    Ok(Report::ok(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mchain_core::{ChainError, DigestAlgorithm};
    use mchain_tree::{check_hex_json, MerkleTree};

    const ALG: DigestAlgorithm = DigestAlgorithm::Sha256;

    #[test]
    fn join_links_sub_tree_into_parent() {
        let low = MerkleTree::from_items(ALG, ["a", "b", "c"]).build().unwrap();
        let mut high = MerkleTree::new(ALG);
        high.add("x");
        high.add_prehashed(low.root().clone());
        high.add("y");
        let high = high.build().unwrap();

        let low_json = low.get_hex_chain(2).unwrap().to_json().unwrap();
        let high_json = high.get_hex_chain(1).unwrap().to_json().unwrap();
        let report = join_report(&low_json, &high_json, false).unwrap();

        assert_eq!(report.code, 0);
        assert_eq!(check_hex_json(&report.output, &ALG).unwrap(), high.root_hex());
    }

    #[test]
    fn join_rejects_disconnected_chains() {
        let one = MerkleTree::from_items(ALG, ["a", "b"]).build().unwrap();
        let two = MerkleTree::from_items(ALG, ["c", "d"]).build().unwrap();
        let err = join_report(
            &one.get_hex_chain(0).unwrap().to_json().unwrap(),
            &two.get_hex_chain(0).unwrap().to_json().unwrap(),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChainError>(),
            Some(ChainError::DoNotConnect { .. })
        ));
    }

    #[test]
    fn run_join_reads_files() {
        let low = MerkleTree::from_items(ALG, ["a", "b"]).build().unwrap();
        let high = MerkleTree::from_digests(ALG, [low.root().clone()])
            .build()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let low_path = dir.path().join("low.json");
        let high_path = dir.path().join("high.json");
        std::fs::write(&low_path, low.get_hex_chain(0).unwrap().to_json().unwrap()).unwrap();
        std::fs::write(&high_path, high.get_hex_chain(0).unwrap().to_json().unwrap()).unwrap();

        let args = JoinArgs {
            low: low_path,
            high: high_path,
            pretty: true,
        };
        assert_eq!(run_join(&args).unwrap(), 0);
        assert!(join_report("[]", "[]", false).is_err());
    }

    #[test]
    fn join_names_the_malformed_link() {
        let tree = MerkleTree::from_items(ALG, ["a", "b"]).build().unwrap();
        let low = tree.get_hex_chain(0).unwrap().to_json().unwrap();
        let err = join_report(&low.replacen("RIGHT", "X", 1), &low, false).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.starts_with("failed to read low chain"));
        assert!(msg.contains("malformed chain: link 1"));
    }
}
