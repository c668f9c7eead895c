//! engine::consistency
//!
//! Checks that git-derived state can be trusted before selecting stacks.
//!
//! 1. The default remote is configured and knows the default branch.
//! 2. HEAD is not diverged from the remote default branch: their merge-base
//!    must be the remote commit itself.

use crate::core::config::GitConfig;
use crate::core::types::Oid;
use crate::git::GitHistory;

use super::{GitStateError, SelectError};

/// Validates the repository against the configured remote and branch.
pub struct RemoteConsistencyChecker<'a> {
    git: &'a dyn GitHistory,
    config: &'a GitConfig,
}

impl<'a> RemoteConsistencyChecker<'a> {
    pub fn new(git: &'a dyn GitHistory, config: &'a GitConfig) -> Self {
        Self { git, config }
    }

    /// Run both checks, existence first.
    pub fn check(&self, head: &Oid) -> Result<(), SelectError> {
        self.check_default_remote()?;
        self.check_head_fresh(head)?;
        Ok(())
    }

    /// The default remote exists and has the default branch.
    ///
    /// # Errors
    ///
    /// - [`GitStateError::MissingRemote`] listing the configured remotes
    /// - [`GitStateError::MissingBranch`] listing the remote's branches
    pub fn check_default_remote(&self) -> Result<(), SelectError> {
        let remotes = self.git.remotes()?;
        let wanted = &self.config.default_remote;
        let branch = self.config.default_branch.as_str();

        let Some(remote) = remotes.iter().find(|r| &r.name == wanted) else {
            return Err(GitStateError::MissingRemote {
                remote: wanted.clone(),
                available: remotes.iter().map(|r| r.name.clone()).collect(),
            }
            .into());
        };

        if !remote.branches.iter().any(|b| b == branch) {
            return Err(GitStateError::MissingBranch {
                remote: wanted.clone(),
                branch: branch.to_string(),
                available: remote.branches.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// HEAD contains the commit the remote default branch points at.
    ///
    /// Asks the remote for its current commit rather than trusting the local
    /// tracking ref. Returns that commit.
    ///
    /// # Errors
    ///
    /// - [`GitStateError::RemoteFetch`] if the remote cannot be queried
    /// - [`GitStateError::OutOfDate`] if no merge-base exists or it differs
    ///   from the remote commit
    pub fn check_head_fresh(&self, head: &Oid) -> Result<Oid, SelectError> {
        let remote_ref = self.config.remote_default_branch_ref();
        let remote = self
            .git
            .fetch_remote_rev(&self.config.default_remote, self.config.default_branch.as_str())
            .map_err(|source| GitStateError::RemoteFetch {
                remote_ref: remote_ref.clone(),
                source,
            })?;

        let out_of_date = || -> SelectError {
            GitStateError::OutOfDate {
                remote_ref: remote_ref.clone(),
            }
            .into()
        };

        match self.git.merge_base(head.as_str(), remote.commit.as_str()) {
            Ok(base) if base == remote.commit => Ok(remote.commit),
            Ok(base) => {
                tracing::debug!(
                    head_hash = %head,
                    default_branch = %remote_ref,
                    default_hash = %remote.commit,
                    merge_base_hash = %base,
                    "default branch is not the merge-base of HEAD"
                );
                Err(out_of_date())
            }
            Err(err) => {
                tracing::debug!(
                    head_hash = %head,
                    default_branch = %remote_ref,
                    default_hash = %remote.commit,
                    error = %err,
                    "no merge-base between HEAD and default branch"
                );
                Err(out_of_date())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{label_oid, MockHistory, MockOp};

    fn config() -> GitConfig {
        GitConfig::default()
    }

    /// a - b (origin/main) - c (HEAD)
    fn ahead() -> MockHistory {
        MockHistory::new()
            .commit("a", &[])
            .commit("b", &["a"])
            .commit("c", &["b"])
            .set_ref("origin/main", "b")
            .head("c")
            .remote("origin", &["dev", "main"])
            .advertise("origin", "main", "b")
    }

    mod default_remote {
        use super::*;

        #[test]
        fn present() {
            let git = ahead();
            let cfg = config();
            assert!(RemoteConsistencyChecker::new(&git, &cfg)
                .check_default_remote()
                .is_ok());
        }

        #[test]
        fn missing_remote_lists_remotes() {
            let git = MockHistory::new().remote("upstream", &["main"]);
            let cfg = config();
            let err = RemoteConsistencyChecker::new(&git, &cfg)
                .check_default_remote()
                .unwrap_err();

            assert!(matches!(
                err,
                SelectError::GitState(GitStateError::MissingRemote { .. })
            ));
            let msg = err.to_string();
            assert!(msg.contains("\"origin\""), "{msg}");
            assert!(msg.contains("upstream"), "{msg}");
        }

        #[test]
        fn no_remotes_at_all() {
            let git = MockHistory::new();
            let cfg = config();
            let err = RemoteConsistencyChecker::new(&git, &cfg)
                .check_default_remote()
                .unwrap_err();
            assert!(err.to_string().contains("none"));
        }

        #[test]
        fn missing_branch_lists_branches() {
            let git = MockHistory::new().remote("origin", &["dev", "release"]);
            let cfg = config();
            let err = RemoteConsistencyChecker::new(&git, &cfg)
                .check_default_remote()
                .unwrap_err();

            assert_eq!(
                err.to_string(),
                "remote \"origin\" has no default branch \"main\", branches: [dev, release]"
            );
        }

        #[test]
        fn listing_failure_is_a_git_error() {
            let git = ahead().fail(MockOp::Remotes);
            let cfg = config();
            let err = RemoteConsistencyChecker::new(&git, &cfg)
                .check_default_remote()
                .unwrap_err();
            assert!(matches!(err, SelectError::Git(_)));
        }
    }

    mod freshness {
        use super::*;

        #[test]
        fn head_ahead_of_remote_is_fresh() {
            let git = ahead();
            let cfg = config();
            let remote = RemoteConsistencyChecker::new(&git, &cfg)
                .check_head_fresh(&label_oid("c"))
                .unwrap();
            assert_eq!(remote, label_oid("b"));
        }

        #[test]
        fn head_at_remote_is_fresh() {
            let git = ahead().head("b");
            let cfg = config();
            assert!(RemoteConsistencyChecker::new(&git, &cfg)
                .check_head_fresh(&label_oid("b"))
                .is_ok());
        }

        #[test]
        fn diverged_head_is_out_of_date() {
            // a - b (HEAD)
            //   \
            //    x (remote main)
            let git = ahead()
                .commit("x", &["a"])
                .advertise("origin", "main", "x");
            let cfg = config();
            let err = RemoteConsistencyChecker::new(&git, &cfg)
                .check_head_fresh(&label_oid("b"))
                .unwrap_err();

            assert!(matches!(
                err,
                SelectError::GitState(GitStateError::OutOfDate { .. })
            ));
            assert!(err
                .to_string()
                .contains("Please update the current branch with the latest changes from the default branch."));
        }

        #[test]
        fn unknown_remote_commit_is_out_of_date() {
            // Remote advertises a commit not present locally.
            let git = ahead()
                .commit("z", &[])
                .advertise("origin", "main", "z");
            let cfg = config();
            let err = RemoteConsistencyChecker::new(&git, &cfg)
                .check_head_fresh(&label_oid("c"))
                .unwrap_err();
            assert!(matches!(
                err,
                SelectError::GitState(GitStateError::OutOfDate { .. })
            ));
        }

        #[test]
        fn unreachable_remote() {
            let git = ahead().fail(MockOp::FetchRemoteRev);
            let cfg = config();
            let err = RemoteConsistencyChecker::new(&git, &cfg)
                .check_head_fresh(&label_oid("c"))
                .unwrap_err();
            assert!(matches!(
                err,
                SelectError::GitState(GitStateError::RemoteFetch { .. })
            ));
        }
    }

    #[test]
    fn check_runs_existence_first() {
        let git = MockHistory::new()
            .commit("a", &[])
            .head("a")
            .remote("upstream", &["main"]);
        let cfg = config();
        let err = RemoteConsistencyChecker::new(&git, &cfg)
            .check(&label_oid("a"))
            .unwrap_err();

        assert!(matches!(
            err,
            SelectError::GitState(GitStateError::MissingRemote { .. })
        ));
        assert_eq!(git.calls(), vec![MockOp::Remotes]);
    }
}
