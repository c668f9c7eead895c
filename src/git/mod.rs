//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. No other module imports
//! `git2`. The selection engine depends on the [`GitHistory`] capability
//! rather than on [`Git`] itself, so resolver and consistency logic can be
//! exercised against [`mock::MockHistory`].
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Revision resolution (`HEAD`, `origin/main`, `HEAD^`)
//! - Ancestry queries (is-ancestor, first-parent, fork point, merge-base)
//! - Remote enumeration, URLs and ls-remote style lookups
//!
//! # Example
//!
//! ```ignore
//! use stackpick::git::{Git, GitHistory};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.rev_parse("HEAD")?;
//! let ahead = !git.is_ancestor("HEAD", "origin/main")?;
//! ```

mod history;
mod interface;
pub mod mock;

pub use history::{GitHistory, Remote, RemoteRev};
pub use interface::{Git, GitError};
