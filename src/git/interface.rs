//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! stackpick. All git interactions flow through [`Git`], which provides
//! structured results and normalizes errors into typed failure categories.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RevisionNotFound`]: A revision does not resolve to a commit
//! - [`GitError::DetachedHead`]: HEAD does not point at a branch
//! - [`GitError::NoMergeBase`]: Two histories share no commit
//! - [`GitError::RemoteNotFound`] / [`GitError::RemoteBranchNotFound`]
//! - [`GitError::RemoteUnreachable`]: The remote could not be contacted
//!
//! # Example
//!
//! ```ignore
//! use stackpick::git::{Git, GitHistory};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.rev_parse("HEAD")?;
//! println!("HEAD is at {}", head.short(7));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::history::{GitHistory, Remote, RemoteRev};
use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Revision does not resolve to a commit.
    #[error("revision not found: {rev}")]
    RevisionNotFound {
        /// The revision that was not found
        rev: String,
    },

    /// HEAD is detached or unborn.
    #[error("HEAD is not on a branch")]
    DetachedHead,

    /// The two revisions share no history.
    #[error("no merge base between {a} and {b}")]
    NoMergeBase {
        /// First revision
        a: String,
        /// Second revision
        b: String,
    },

    /// Remote is not configured.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// The remote name
        name: String,
    },

    /// Remote does not advertise the branch.
    #[error("remote {remote} has no branch {branch}")]
    RemoteBranchNotFound {
        /// The remote name
        remote: String,
        /// The branch name
        branch: String,
    },

    /// Remote could not be contacted.
    #[error("cannot reach remote {remote}: {message}")]
    RemoteUnreachable {
        /// The remote name
        remote: String,
        /// Transport error message
        message: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid branch name.
    #[error("invalid branch name: {message}")]
    InvalidBranchName {
        /// Description of the problem
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Map a git2 error raised while resolving `rev`.
    fn from_git2(err: git2::Error, rev: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound
            | git2::ErrorCode::InvalidSpec
            | git2::ErrorCode::Ambiguous
            | git2::ErrorCode::UnbornBranch => GitError::RevisionNotFound {
                rev: rev.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", rev, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidBranchName { message: msg },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2`.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Root of the working tree.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    fn resolve(&self, rev: &str) -> Result<git2::Oid, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| GitError::from_git2(e, rev))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, rev))?;
        Ok(commit.id())
    }

    fn to_oid(oid: git2::Oid) -> Result<Oid, GitError> {
        Ok(Oid::new(oid.to_string())?)
    }

    /// Commits recorded for `upstream`, newest first: its reflog followed by
    /// its current value.
    fn reflog_candidates(&self, upstream: &str) -> Result<Vec<git2::Oid>, GitError> {
        let mut candidates = Vec::new();

        if let Ok(reference) = self.repo.resolve_reference_from_short_name(upstream) {
            if let Some(name) = reference.name() {
                if let Ok(reflog) = self.repo.reflog(name) {
                    candidates.extend(reflog.iter().map(|entry| entry.id_new()));
                }
            }
        }

        let current = self.resolve(upstream)?;
        if !candidates.contains(&current) {
            candidates.push(current);
        }
        Ok(candidates)
    }
}

impl GitHistory for Git {
    fn rev_parse(&self, rev: &str) -> Result<Oid, GitError> {
        Self::to_oid(self.resolve(rev)?)
    }

    fn current_branch(&self) -> Result<BranchName, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                return Err(GitError::DetachedHead)
            }
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            return Err(GitError::DetachedHead);
        }

        let name = head.shorthand().ok_or(GitError::DetachedHead)?;
        Ok(BranchName::new(name)?)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
        let ancestor = self.resolve(ancestor)?;
        let descendant = self.resolve(descendant)?;

        // A commit is its own ancestor
        if ancestor == descendant {
            return Ok(true);
        }

        Ok(self.repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn is_first_parent_ancestor(
        &self,
        ancestor: &str,
        descendant: &str,
    ) -> Result<bool, GitError> {
        let ancestor = self.resolve(ancestor)?;
        let descendant = self.resolve(descendant)?;

        let mut walk = self.repo.revwalk()?;
        walk.push(descendant)?;
        walk.simplify_first_parent()?;

        for oid in walk {
            if oid? == ancestor {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn find_fork_point(&self, upstream: &str, rev: &str) -> Result<Option<Oid>, GitError> {
        let rev = self.resolve(rev)?;

        for candidate in self.reflog_candidates(upstream)? {
            if candidate == rev || self.repo.graph_descendant_of(rev, candidate)? {
                return Ok(Some(Self::to_oid(candidate)?));
            }
        }
        Ok(None)
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Oid, GitError> {
        let a_oid = self.resolve(a)?;
        let b_oid = self.resolve(b)?;

        match self.repo.merge_base(a_oid, b_oid) {
            Ok(oid) => Self::to_oid(oid),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Err(GitError::NoMergeBase {
                a: a.to_string(),
                b: b.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn remotes(&self) -> Result<Vec<Remote>, GitError> {
        let names = self.repo.remotes()?;

        let mut tracking = Vec::new();
        for branch in self.repo.branches(Some(git2::BranchType::Remote))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                tracking.push(name.to_string());
            }
        }

        let mut remotes: Vec<Remote> = names
            .iter()
            .flatten()
            .map(|name| {
                let prefix = format!("{}/", name);
                let mut branches: Vec<String> = tracking
                    .iter()
                    .filter_map(|t| t.strip_prefix(&prefix))
                    .filter(|b| *b != "HEAD")
                    .map(String::from)
                    .collect();
                branches.sort();
                Remote {
                    name: name.to_string(),
                    branches,
                }
            })
            .collect();

        remotes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(remotes)
    }

    fn fetch_remote_rev(&self, remote: &str, branch: &str) -> Result<RemoteRev, GitError> {
        let mut handle = match self.repo.find_remote(remote) {
            Ok(r) => r,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                return Err(GitError::RemoteNotFound {
                    name: remote.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let unreachable = |e: git2::Error| GitError::RemoteUnreachable {
            remote: remote.to_string(),
            message: e.message().to_string(),
        };

        handle
            .connect(git2::Direction::Fetch)
            .map_err(unreachable)?;

        let refname = format!("refs/heads/{}", branch);
        let advertised = handle
            .list()
            .map_err(unreachable)?
            .iter()
            .find(|head| head.name() == refname)
            .map(|head| head.oid());

        // Best-effort: the advertisement is already read.
        let _ = handle.disconnect();

        match advertised {
            Some(oid) => Ok(RemoteRev {
                refname,
                commit: Self::to_oid(oid)?,
            }),
            None => Err(GitError::RemoteBranchNotFound {
                remote: remote.to_string(),
                branch: branch.to_string(),
            }),
        }
    }

    fn url(&self, remote: &str) -> Result<String, GitError> {
        match self.repo.find_remote(remote) {
            Ok(r) => r
                .url()
                .map(String::from)
                .ok_or_else(|| GitError::Internal {
                    message: format!("remote {} has a non UTF-8 url", remote),
                }),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Err(GitError::RemoteNotFound {
                name: remote.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn error_display_formatting() {
            let err = GitError::RemoteBranchNotFound {
                remote: "origin".to_string(),
                branch: "main".to_string(),
            };
            assert_eq!(err.to_string(), "remote origin has no branch main");

            let err = GitError::NoMergeBase {
                a: "HEAD".to_string(),
                b: "origin/main".to_string(),
            };
            assert_eq!(err.to_string(), "no merge base between HEAD and origin/main");
        }

        #[test]
        fn type_errors_map_to_variants() {
            let err: GitError = TypeError::InvalidOid("zz".to_string()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));

            let err: GitError = TypeError::InvalidBranchName("a..b".to_string()).into();
            assert!(matches!(err, GitError::InvalidBranchName { .. }));
        }

        #[test]
        fn not_found_maps_to_revision_not_found() {
            let err = GitError::from_git2(
                git2::Error::new(
                    git2::ErrorCode::NotFound,
                    git2::ErrorClass::Reference,
                    "missing",
                ),
                "origin/main",
            );
            assert!(matches!(err, GitError::RevisionNotFound { rev } if rev == "origin/main"));
        }
    }

    #[test]
    fn open_non_repository_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let git = Git::open(dir.path());
        assert!(matches!(git, Err(GitError::NotARepo { .. })));
    }
}
