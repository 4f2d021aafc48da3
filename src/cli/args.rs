//! Command line argument parsing for the Xiphos CLI using clap.

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Xiphos - boolean retrieval over a sharded compressed inverted index
#[derive(Parser, Debug, Clone)]
#[command(name = "xiphos")]
#[command(about = "Boolean keyword retrieval over a sharded compressed inverted index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct XiphosArgs {
    /// Path to the index directory holding the shard files
    #[arg(short = 'i', long, value_name = "INDEX_PATH")]
    pub index: PathBuf,

    /// Path to the collection file
    #[arg(short = 'c', long, value_name = "COLLECTION_PATH")]
    pub collection: PathBuf,

    /// Boolean query: whitespace-separated terms and AND/OR operators
    #[arg(short = 'q', long, value_name = "QUERY")]
    pub query: String,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl XiphosArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_basic_invocation() {
        let args = XiphosArgs::try_parse_from([
            "xiphos",
            "--index",
            "/path/to/index",
            "--collection",
            "/path/to/collection.txt",
            "--query",
            "cat AND dog",
        ])
        .unwrap();

        assert_eq!(args.index, PathBuf::from("/path/to/index"));
        assert_eq!(args.collection, PathBuf::from("/path/to/collection.txt"));
        assert_eq!(args.query, "cat AND dog");
    }

    #[test]
    fn test_short_flags() {
        let args = XiphosArgs::try_parse_from([
            "xiphos",
            "-i",
            "idx",
            "-c",
            "col.txt",
            "-q",
            "cat dog OR",
        ])
        .unwrap();

        assert_eq!(args.query, "cat dog OR");
    }

    #[test]
    fn test_missing_required_arguments_fail() {
        assert!(XiphosArgs::try_parse_from(["xiphos"]).is_err());
        assert!(XiphosArgs::try_parse_from(["xiphos", "--index", "idx"]).is_err());
        assert!(
            XiphosArgs::try_parse_from(["xiphos", "--index", "idx", "--collection", "col.txt"])
                .is_err()
        );
    }

    #[test]
    fn test_verbosity_levels() {
        let base = ["xiphos", "-i", "idx", "-c", "col.txt", "-q", "cat"];

        // Default verbosity
        let args = XiphosArgs::try_parse_from(base).unwrap();
        assert_eq!(args.verbosity(), 1);

        // Multiple verbose flags
        let mut with_verbose = base.to_vec();
        with_verbose.push("-vv");
        let args = XiphosArgs::try_parse_from(with_verbose).unwrap();
        assert_eq!(args.verbosity(), 2);

        // Quiet flag
        let mut with_quiet = base.to_vec();
        with_quiet.push("--quiet");
        let args = XiphosArgs::try_parse_from(with_quiet).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args = XiphosArgs::try_parse_from([
            "xiphos", "-i", "idx", "-c", "col.txt", "-q", "cat", "--format", "json",
        ])
        .unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
    }
}
