//! Command-line grammar for the `pyfence` binary.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Top-level arguments after configuration flags have been split off.
#[derive(Debug, Parser)]
#[command(
    name = "pyfence",
    version,
    about = "Run untrusted Python snippets in a locked-down interpreter"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Execute a snippet and print the outcome as JSON.
    Exec {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Run a snippet against one input and compare its output.
    Test {
        /// Input bound as `test_input`, written as JSON.
        #[arg(long)]
        input: String,
        /// Output expected on stdout.
        #[arg(long)]
        expected: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Run a snippet against a JSON file of test cases.
    Validate {
        /// JSON array of `{"input": ..., "expected": "..."}` objects.
        #[arg(long)]
        cases: Utf8PathBuf,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print what snippets are allowed to use.
    Describe,
}

/// Where the snippet comes from.
#[derive(Debug, Args)]
pub(crate) struct SourceArgs {
    /// Snippet source given inline.
    #[arg(long, conflicts_with = "file")]
    pub(crate) code: Option<String>,
    /// File holding the snippet; `-` or nothing reads stdin.
    pub(crate) file: Option<Utf8PathBuf>,
}
