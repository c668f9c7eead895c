//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Result and diagnostic formatting
//! - [`logging`] - Structured logging setup
//!
//! # Design
//!
//! All output goes through this module so stdout stays machine-readable and
//! diagnostics stay on stderr.

pub mod logging;
pub mod output;
