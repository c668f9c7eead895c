//! stackpick - stack selection for infrastructure monorepos
//!
//! A repository holds many independently deployable stacks. stackpick decides
//! which of them a command should act on: stacks matching tag predicates,
//! stacks the cloud reports as unhealthy, and the git baseline revision that
//! change detection diffs against.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Revision resolution, consistency checks and the filter pipeline
//! - [`core`] - Domain types, configuration, stack discovery
//! - [`git`] - Single interface for all Git operations
//! - [`cloud`] - Cloud stack status source and repository normalization
//! - [`auth`] - Bearer credentials for the cloud API
//! - [`ui`] - Logging and output formatting
//!
//! # Correctness Invariants
//!
//! 1. Output is sorted by stack path and reproducible for identical inputs
//! 2. Remote records only affect stacks of the same repository
//! 3. Baseline resolution returns a usable revision or fails
//! 4. Fatal errors produce no partial output

pub mod auth;
pub mod cli;
pub mod cloud;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
