//! git::history
//!
//! The history-query capability the selection engine depends on.
//!
//! # Design
//!
//! The engine never talks to `git2` directly. It consumes [`GitHistory`],
//! which [`crate::git::Git`] implements over a real repository and
//! [`crate::git::mock::MockHistory`] implements over a scripted topology.
//!
//! Revision arguments are anything `git rev-parse` accepts (`HEAD`,
//! `origin/main`, `HEAD^`, a hex commit id).

use crate::core::types::{BranchName, Oid};

use super::GitError;

/// A configured remote and the branches it is known to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Remote name (e.g. `origin`).
    pub name: String,
    /// Branch names under `refs/remotes/<name>/`, sorted.
    pub branches: Vec<String>,
}

/// The commit a remote advertises for one of its branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRev {
    /// Full ref name on the remote (e.g. `refs/heads/main`).
    pub refname: String,
    /// Commit the ref points at.
    pub commit: Oid,
}

/// Revision, ancestry and remote queries.
pub trait GitHistory {
    /// Resolve a revision to the commit it names.
    fn rev_parse(&self, rev: &str) -> Result<Oid, GitError>;

    /// Name of the checked-out branch.
    ///
    /// # Errors
    ///
    /// [`GitError::DetachedHead`] when HEAD does not point at a branch.
    fn current_branch(&self) -> Result<BranchName, GitError>;

    /// Whether `ancestor` is reachable from `descendant` (a commit is its own
    /// ancestor).
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, GitError>;

    /// Whether `ancestor` lies on the first-parent chain of `descendant`.
    fn is_first_parent_ancestor(&self, ancestor: &str, descendant: &str)
        -> Result<bool, GitError>;

    /// The point where `rev` forked from the history recorded for `upstream`.
    ///
    /// Returns `Ok(None)` when no fork point exists.
    fn find_fork_point(&self, upstream: &str, rev: &str) -> Result<Option<Oid>, GitError>;

    /// Best common ancestor of two revisions.
    ///
    /// # Errors
    ///
    /// [`GitError::NoMergeBase`] when the histories are unrelated.
    fn merge_base(&self, a: &str, b: &str) -> Result<Oid, GitError>;

    /// Configured remotes with their known branches, sorted by name.
    fn remotes(&self) -> Result<Vec<Remote>, GitError>;

    /// Ask `remote` which commit its `branch` points at.
    fn fetch_remote_rev(&self, remote: &str, branch: &str) -> Result<RemoteRev, GitError>;

    /// URL configured for `remote`.
    fn url(&self, remote: &str) -> Result<String, GitError>;
}
