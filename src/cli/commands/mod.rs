//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Opens the project and calls the engine
//! 3. Prints results to stdout only once everything succeeded
//!
//! # Async Commands
//!
//! `list` may talk to the cloud API, so it drives the engine on a tokio
//! runtime created for the invocation.

mod base_ref;
mod completion;
mod list;

pub use base_ref::base_ref;
pub use completion::completion;
pub use list::list;

use crate::cli::args::Command;
use crate::core::config::ConfigWarning;
use crate::engine::Context;
use anyhow::{Context as _, Result};
use std::path::PathBuf;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::List {
            tags,
            no_tags,
            experimental_status,
        } => list(ctx, &tags, &no_tags, experimental_status.as_deref()),
        Command::BaseRef => base_ref(ctx),
        Command::Completion { shell } => completion(shell),
    }
}

/// Directory the command acts on.
fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("failed to determine current directory"),
    }
}

fn report_warnings(warnings: &[ConfigWarning]) {
    for w in warnings {
        crate::ui::output::warn(format!("{} ({})", w.message, w.source));
    }
}
