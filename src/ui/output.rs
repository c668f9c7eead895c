//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout, one item per line, so they compose with shell
//! pipelines. Diagnostics go to stderr. Nothing is printed to stdout until
//! a command has fully succeeded.

use std::fmt::Display;
use std::io::Write;

/// Render items one per line, each terminated by a newline.
///
/// An empty list renders as the empty string.
pub fn format_lines<T: Display>(items: &[T]) -> String {
    items.iter().map(|item| format!("{}\n", item)).collect()
}

/// Write items one per line to stdout.
pub fn print_lines<T: Display>(items: &[T]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(format_lines(items).as_bytes())?;
    stdout.flush()
}

/// Print an error with its cause chain (always shown).
pub fn error(err: &anyhow::Error) {
    eprintln!("error: {:#}", err);
}

/// Print a warning message.
pub fn warn(message: impl Display) {
    eprintln!("warning: {}", message);
}
