//! core::project
//!
//! The project a command operates on.
//!
//! # Root discovery
//!
//! 1. The work tree of the enclosing git repository, if any
//! 2. Otherwise the nearest ancestor holding `stackpick.toml`
//! 3. Otherwise the working directory itself
//!
//! A project outside git has no remote: its repository is always
//! [`NormalizedRepo::Local`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::config::{Config, ConfigError, ConfigWarning, PROJECT_CONFIG_FILE};
use super::types::{StackPath, TypeError};
use crate::cloud::{normalize_git_uri, NormalizedRepo};
use crate::git::{Git, GitError, GitHistory};

/// Errors from opening a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("working directory '{path}' is not accessible: {source}")]
    WorkingDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("working directory '{wd}' is outside the project root '{root}'")]
    OutsideRoot { wd: PathBuf, root: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Path(#[from] TypeError),
}

/// An opened project.
#[derive(Debug)]
pub struct Project {
    /// Project root directory.
    pub root: PathBuf,
    /// Working directory, within `root`.
    pub wd: PathBuf,
    /// Loaded configuration.
    pub config: Config,
    git: Option<Git>,
}

impl Project {
    /// Open the project enclosing `cwd`.
    ///
    /// Returns the project and any configuration warnings.
    pub fn open(cwd: &Path) -> Result<(Self, Vec<ConfigWarning>), ProjectError> {
        let wd = cwd
            .canonicalize()
            .map_err(|source| ProjectError::WorkingDir {
                path: cwd.to_path_buf(),
                source,
            })?;

        let (root, git) = match Git::open(&wd) {
            Ok(git) => {
                let root = git.work_dir()?.canonicalize().map_err(|source| {
                    ProjectError::WorkingDir {
                        path: wd.clone(),
                        source,
                    }
                })?;
                (root, Some(git))
            }
            Err(GitError::NotARepo { .. }) => (find_config_root(&wd), None),
            Err(e) => return Err(e.into()),
        };

        if !wd.starts_with(&root) {
            return Err(ProjectError::OutsideRoot { wd, root });
        }

        let loaded = Config::load(&root)?;
        tracing::debug!(
            root = %root.display(),
            wd = %wd.display(),
            git = git.is_some(),
            "opened project"
        );

        Ok((
            Self {
                root,
                wd,
                config: loaded.config,
                git,
            },
            loaded.warnings,
        ))
    }

    /// The git repository, if the project is tracked by git.
    pub fn git(&self) -> Option<&Git> {
        self.git.as_ref()
    }

    /// The working directory as a project-absolute path.
    pub fn wd_path(&self) -> Result<StackPath, ProjectError> {
        let rel = self.wd.strip_prefix(&self.root).unwrap_or(Path::new(""));
        Ok(StackPath::from_relative(rel)?)
    }

    /// The normalized repository of the default remote.
    ///
    /// Projects outside git, and repositories whose default remote URL
    /// cannot be read, are local.
    pub fn normalized_repo(&self) -> NormalizedRepo {
        let Some(git) = &self.git else {
            return NormalizedRepo::Local;
        };

        let remote = self.config.git().default_remote;
        match git.url(&remote) {
            Ok(url) => normalize_git_uri(&url),
            Err(err) => {
                tracing::warn!(
                    action = "project.normalized_repo",
                    remote = %remote,
                    error = %err,
                    "failed to retrieve repository URL"
                );
                NormalizedRepo::Local
            }
        }
    }
}

/// Nearest ancestor of `wd` (inclusive) holding the project config file.
fn find_config_root(wd: &Path) -> PathBuf {
    wd.ancestors()
        .find(|dir| dir.join(PROJECT_CONFIG_FILE).is_file())
        .unwrap_or(wd)
        .to_path_buf()
}
