//! engine
//!
//! Decides which stacks a command acts on.
//!
//! # Components
//!
//! - [`revision`] - Baseline revision resolution over git topology
//! - [`consistency`] - Remote/branch existence and HEAD freshness checks
//! - [`tags`] - Include/exclude tag predicates
//! - [`health`] - Cloud health classification
//! - [`selector`] - The pipeline combining the filters
//!
//! # Error Taxonomy
//!
//! Every fatal condition is a [`SelectError`] variant. A failed git probe
//! during revision resolution is not an error: it degrades the resolution
//! toward the fallback and is recorded on the [`Resolution`].

pub mod consistency;
pub mod health;
pub mod revision;
pub mod selector;
pub mod tags;

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::AuthError;
use crate::cloud::CloudError;
use crate::core::config::ConfigError;
use crate::core::project::ProjectError;
use crate::core::stack::DiscoveryError;
use crate::git::GitError;

pub use consistency::RemoteConsistencyChecker;
pub use health::{CloudHealthFilter, Health, StatusFilter};
pub use revision::{BaseCase, GitSnapshot, Probe, Resolution, RevisionResolver};
pub use selector::{SelectionCriteria, SelectionResult, StackSelector};
pub use tags::TagFilter;

/// Execution context for commands.
///
/// Contains global settings that affect all command execution.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override
    pub cwd: Option<PathBuf>,
    /// Enable debug logging
    pub debug: bool,
    /// Baseline revision override (`--git-change-base`)
    pub git_change_base: Option<String>,
}

/// Git states in which selection cannot be trusted.
#[derive(Debug, Error)]
pub enum GitStateError {
    /// The default remote is not configured.
    #[error("repository must have a configured {remote:?} remote, remotes: {}", list(.available))]
    MissingRemote {
        remote: String,
        available: Vec<String>,
    },

    /// The default remote lacks the default branch.
    #[error("remote {remote:?} has no default branch {branch:?}, branches: {}", list(.available))]
    MissingBranch {
        remote: String,
        branch: String,
        available: Vec<String>,
    },

    /// HEAD diverged from the remote default branch.
    #[error(
        "HEAD is out of date with {remote_ref}. Please update the current branch with the \
         latest changes from the default branch."
    )]
    OutOfDate { remote_ref: String },

    /// The remote could not tell its default branch commit.
    #[error("fetching remote commit of {remote_ref}: {source}")]
    RemoteFetch {
        remote_ref: String,
        #[source]
        source: GitError,
    },

    /// A revision the decision depends on does not resolve.
    #[error("cannot resolve {rev}: {source}")]
    Unresolvable {
        rev: String,
        #[source]
        source: GitError,
    },
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        format!("[{}]", items.join(", "))
    }
}

/// Fatal selection errors.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Invalid or conflicting filter flags.
    #[error("{0}")]
    Configuration(String),

    /// Status filtering requested for a repository without a hosted remote.
    #[error("unhealthy status filter does not work with filesystem based remotes")]
    UnsupportedRemote,

    #[error(transparent)]
    GitState(#[from] GitStateError),

    /// Fetching remote stack statuses failed.
    #[error("failed to fetch stack status")]
    Network(#[from] CloudError),

    #[error("no usable cloud credential")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}
