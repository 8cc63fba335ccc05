//! # mchain CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mchain_cli::join::{run_join, JoinArgs};
use mchain_cli::tree::{run_chain, run_root, ChainArgs, RootArgs};
use mchain_cli::verify::{run_verify, VerifyArgs};

/// Binary hash trees and inclusion chains.
///
/// Computes the root of a list of items, extracts the inclusion chain of
/// one item, verifies a chain with no access to the tree, and joins a
/// chain through a sub-tree with a chain through its parent tree.
#[derive(Parser, Debug)]
#[command(name = "mchain", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write log events to stderr as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the root digest of the tree over the items in FILE.
    Root(RootArgs),

    /// Print the hex inclusion chain of one item as JSON.
    Chain(ChainArgs),

    /// Verify a hex chain, optionally against a trusted root.
    Verify(VerifyArgs),

    /// Join a chain through a sub-tree with a chain through its parent tree.
    Join(JoinArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("mchain CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Root(args) => run_root(&args),
        Commands::Chain(args) => run_chain(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::Join(args) => run_join(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
