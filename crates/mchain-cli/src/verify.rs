//! # Verify Subcommand
//!
//! Verifies a hex chain document with nothing but the chain and a digest
//! algorithm. A chain that verifies only proves inclusion under the root
//! it carries; pass `--root` with a root obtained from a trusted source to
//! prove inclusion in that tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use mchain_core::{DigestAlgorithm, MchainError};
use mchain_tree::{check_hex_chain, HexChain};

use crate::input::read_source;
use crate::Report;

/// Arguments for `mchain verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Chain JSON document, or `-` for standard input.
    #[arg(value_name = "CHAIN_JSON")]
    pub chain: PathBuf,

    /// Trusted root digest (hex) the chain must end in.
    #[arg(long, value_name = "HEX")]
    pub root: Option<String>,

    /// Digest algorithm the chain was built with.
    #[arg(long, default_value_t = DigestAlgorithm::Sha256)]
    pub algorithm: DigestAlgorithm,
}

/// Execute `mchain verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let json = read_source(&args.chain)?;
    Ok(verify_report(&json, args.algorithm, args.root.as_deref())?.emit())
}

/// Verify `json` and describe the outcome.
///
/// A rejected chain is a `FAIL` report with exit code 1; only unreadable
/// input is an error.
pub fn verify_report(
    json: &str,
    algorithm: DigestAlgorithm,
    trusted_root: Option<&str>,
) -> Result<Report> {
    let trusted = trusted_root
        .map(|hex| algorithm.parse_digest(hex))
        .transpose()
        .context("invalid --root digest")?;
    let chain = HexChain::from_json(json).context("failed to parse chain document")?;

    let root = match check_hex_chain(&chain, &algorithm) {
        Ok(root) => root,
        Err(MchainError::Chain(e)) => {
            tracing::info!(len = chain.len(), "chain rejected: {e}");
            return Ok(Report::fail(format!("FAIL: {e}")));
        }
        Err(e) => return Err(e).context("failed to decode chain"),
    };

    if let Some(trusted) = trusted {
        if trusted.to_hex() != root {
            return Ok(Report::fail(format!(
                "FAIL: chain root {root} does not match trusted root {trusted}"
            )));
        }
    }
    Ok(Report::ok(format!("OK: {root}")))
}
