//! cli
//!
//! The `stackpick` command line.
//!
//! Parsing and logging setup happen here; each subcommand lives in
//! [`commands`] and drives the [`crate::engine`]. Selected paths go to
//! stdout, everything else to stderr.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use crate::ui;
use anyhow::Result;

/// Parse the process arguments and run the chosen command.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    ui::logging::init(cli.debug);

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        git_change_base: cli.git_change_base.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
