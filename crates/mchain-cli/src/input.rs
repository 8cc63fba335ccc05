//! # Item Input
//!
//! Reads the item list a tree is built from. One item per line, `\n` or
//! `\r\n` terminated. Empty lines are items, except a single empty line
//! after the final newline. `-` reads standard input.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use mchain_core::DigestAlgorithm;
use mchain_tree::{Built, MerkleTree};

/// Where the items come from and how they become leaves.
#[derive(Args, Debug, Clone)]
pub struct ItemArgs {
    /// File with one item per line, or `-` for standard input.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Digest algorithm used for leaves and internal nodes.
    #[arg(long, default_value_t = DigestAlgorithm::Sha256)]
    pub algorithm: DigestAlgorithm,

    /// Lines are hex digests, used as leaves verbatim.
    #[arg(long)]
    pub prehashed: bool,
}

/// Read a whole file, or standard input when `path` is `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// Split text into items.
pub fn split_items(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Build the tree over `text` as configured by `args`.
pub fn build_tree(text: &str, args: &ItemArgs) -> Result<MerkleTree<DigestAlgorithm, Built>> {
    let mut tree = MerkleTree::new(args.algorithm);
    for (index, item) in split_items(text).into_iter().enumerate() {
        if args.prehashed {
            let digest = args
                .algorithm
                .parse_digest(item)
                .with_context(|| format!("line {}: not a {} digest", index + 1, args.algorithm))?;
            tree.add_prehashed(digest);
        } else {
            tree.add(item);
        }
    }
    tracing::info!(
        leaf_count = tree.leaf_count(),
        algorithm = %args.algorithm,
        prehashed = args.prehashed,
        "read items"
    );
    tree.build()
        .with_context(|| format!("no items in {}", args.file.display()))
}

/// Read the items named by `args` and build their tree.
pub fn load_tree(args: &ItemArgs) -> Result<MerkleTree<DigestAlgorithm, Built>> {
    let text = read_source(&args.file)?;
    build_tree(&text, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb";
    const B: &str = "3e23e8160039594a33894f6564e1b1348bbd7a0088d42c4acb73eeaed59c009d";

    fn args(file: &Path) -> ItemArgs {
        ItemArgs {
            file: file.to_path_buf(),
            algorithm: DigestAlgorithm::Sha256,
            prehashed: false,
        }
    }

    #[test]
    fn split_drops_only_the_final_empty_line() {
        assert_eq!(split_items("a\nb\n"), ["a", "b"]);
        assert_eq!(split_items("a\nb"), ["a", "b"]);
        assert_eq!(split_items("a\n\nb\n"), ["a", "", "b"]);
        assert_eq!(split_items("a\n\n"), ["a", ""]);
        assert_eq!(split_items("a\r\nb\r\n"), ["a", "b"]);
        assert!(split_items("").is_empty());
        assert_eq!(split_items("\n"), [""]);
    }

    #[test]
    fn build_tree_from_text() {
        let tree = build_tree("a\nb\nc\nd\n", &args(Path::new("items.txt"))).unwrap();
        assert_eq!(
            tree.root_hex(),
            "14ede5e8e97ad9372327728f5099b95604a39593cac3bd38a343ad76205213e7"
        );
    }

    #[test]
    fn build_tree_rejects_empty_input() {
        let err = build_tree("", &args(Path::new("empty.txt"))).unwrap_err();
        assert!(format!("{err:#}").contains("tree has no leaves"));
    }

    #[test]
    fn prehashed_lines_must_be_hex() {
        let mut args = args(Path::new("digests.txt"));
        args.prehashed = true;
        let err = build_tree(&format!("{A}\nzz\n"), &args).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let tree = build_tree(&format!("{A}\n{}\n", B.to_uppercase()), &args).unwrap();
        assert_eq!(
            tree.root_hex(),
            "e5a01fee14e0ed5c48714f22180f25ad8365b53f9779f79dc4a3d7e93963f94a"
        );
    }

    #[test]
    fn prehashed_lines_must_match_the_digest_length() {
        let mut args = args(Path::new("digests.txt"));
        args.prehashed = true;

        let err = build_tree("ab\n", &args).unwrap_err();
        assert_eq!(err.to_string(), "line 1: not a sha256 digest");
        assert!(format!("{err:#}").contains("digest is 1 bytes; sha256 digests are 32 bytes"));

        let err = build_tree(&format!("{A}\n\n{B}\n"), &args).unwrap_err();
        assert!(format!("{err:#}").starts_with("line 2: not a sha256 digest: digest is 0 bytes"));

        args.algorithm = DigestAlgorithm::Sha512;
        let err = build_tree(&format!("{A}\n"), &args).unwrap_err();
        assert!(format!("{err:#}").contains("sha512 digests are 64 bytes"));
    }

    #[test]
    fn load_tree_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        std::fs::write(&path, "a\nb\nc\n").unwrap();
        let tree = load_tree(&args(&path)).unwrap();
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn load_tree_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tree(&args(&dir.path().join("missing.txt"))).unwrap_err();
        assert!(err.to_string().contains("failed to read file"));
    }
}
