//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--git-change-base <rev>`: Override the baseline revision

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// stackpick - select the stacks a command should act on
#[derive(Parser, Debug)]
#[command(name = "stackpick")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if stackpick was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Diff HEAD against this revision instead of the computed baseline
    #[arg(short = 'B', long = "git-change-base", global = true, value_name = "REV")]
    pub git_change_base: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stacks, optionally filtered by tags and cloud health
    #[command(
        name = "list",
        long_about = "List the stacks at or below the working directory.\n\n\
            Paths are printed relative to the working directory, one per line, \
            sorted. Tag filters keep stacks carrying every --tags value and none \
            of the --no-tags values.",
        after_help = "\
EXAMPLES:
    # Every stack below the current directory
    stackpick list

    # Production stacks that are not legacy
    stackpick list --tags prod --no-tags legacy

    # Stacks the cloud reports as failed or drifted
    stackpick list --experimental-status=unhealthy"
    )]
    List {
        /// Only stacks carrying all these tags (repeatable, comma-separated)
        #[arg(long = "tags", value_name = "TAGS")]
        tags: Vec<String>,

        /// Skip stacks carrying any of these tags (repeatable, comma-separated)
        #[arg(long = "no-tags", value_name = "TAGS")]
        no_tags: Vec<String>,

        /// Filter by cloud status (only `unhealthy` is supported)
        #[arg(long = "experimental-status", value_name = "STATUS")]
        experimental_status: Option<String>,
    },

    /// Print the revision change detection diffs HEAD against
    #[command(
        name = "base-ref",
        long_about = "Print the baseline revision for change detection.\n\n\
            Verifies that the default remote and branch exist and that HEAD is \
            not behind the remote default branch (unless git.check_remote is \
            false), then prints the baseline. --git-change-base overrides the \
            computed baseline."
    )]
    BaseRef,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    stackpick completion bash >> ~/.bashrc

    # Fish
    stackpick completion fish > ~/.config/fish/completions/stackpick.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
