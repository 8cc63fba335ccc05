//! # Root and Chain Subcommands
//!
//! Build the tree over an item list and print its root, or the hex chain
//! of one item.

use anyhow::{Context, Result};
use clap::Args;

use mchain_core::DigestAlgorithm;
use mchain_tree::{Built, MerkleTree};

use crate::input::{load_tree, ItemArgs};
use crate::Report;

/// Arguments for `mchain root`.
#[derive(Args, Debug)]
pub struct RootArgs {
    #[command(flatten)]
    pub items: ItemArgs,
}

/// Arguments for `mchain chain`.
#[derive(Args, Debug)]
pub struct ChainArgs {
    /// Zero-based index of the item to prove.
    #[arg(long)]
    pub index: usize,

    /// Pretty-print the chain JSON.
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub items: ItemArgs,
}

/// Execute `mchain root`.
pub fn run_root(args: &RootArgs) -> Result<u8> {
    let tree = load_tree(&args.items)?;
    Ok(root_report(&tree).emit())
}

/// Execute `mchain chain`.
pub fn run_chain(args: &ChainArgs) -> Result<u8> {
    let tree = load_tree(&args.items)?;
    Ok(chain_report(&tree, args.index, args.pretty)?.emit())
}

pub fn root_report(tree: &MerkleTree<DigestAlgorithm, Built>) -> Report {
    Report::ok(tree.root_hex())
}

pub fn chain_report(
    tree: &MerkleTree<DigestAlgorithm, Built>,
    index: usize,
    pretty: bool,
) -> Result<Report> {
    let chain = tree.get_hex_chain(index)?;
    let json = if pretty {
        chain.to_json_pretty()
    } else {
        chain.to_json()
    }
    .context("failed to encode chain")?;
    tracing::info!(index, len = chain.len(), "extracted chain");
    Ok(Report::ok(json))
}
