//! # mchain-cli — Command-Line Interface for mchain
//!
//! Provides the `mchain` binary.
//!
//! ## Subcommands
//!
//! - `mchain root <FILE>` — root digest of the tree over the items in FILE.
//! - `mchain chain --index <N> <FILE>` — hex chain JSON for item N.
//! - `mchain verify <CHAIN_JSON> [--root <HEX>]` — verify a chain.
//! - `mchain join <LOW_JSON> <HIGH_JSON>` — join two chains.
//!
//! Items are read one per line; `-` reads standard input.
//!
//! ```bash
//! mchain root items.txt
//! mchain chain --index 2 items.txt > chain.json
//! mchain verify chain.json --root 14ede5e8…13e7
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers build their output as a [`Report`] and only print it at the
//!   edge, so every handler is testable without a process.

pub mod input;
pub mod join;
pub mod tree;
pub mod verify;

/// Text a handler prints and the exit code it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub output: String,
    pub code: u8,
}

impl Report {
    /// Successful outcome, exit code 0.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            code: 0,
        }
    }

    /// Rejected input, exit code 1.
    pub fn fail(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            code: 1,
        }
    }

    /// Print the output to stdout and return the exit code.
    pub fn emit(self) -> u8 {
        println!("{}", self.output);
        self.code
    }
}
