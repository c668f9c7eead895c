//! engine::revision
//!
//! Baseline revision resolution.
//!
//! Given `origin/main` at commit C (the last deployment) and HEAD at H, the
//! resolver picks what H should be diffed against. Cases are evaluated in
//! order and the first match wins:
//!
//! | # | Case | Condition | Baseline |
//! |---|------|-----------|----------|
//! | 1 | Pending, unmerged | H != C and H is not an ancestor of C | `origin/main` |
//! | 2 | Pending, empty branch | H == C on a non-default branch | `origin/main` |
//! | 3 | Deployed, latest | H == C on the default branch | base ref (`HEAD^`) |
//! | 4 | Deployed, historic | H is on C's first-parent chain | base ref |
//! | 5 | Historic merged branch | H forked from `origin/main` | fork point |
//! | 6 | Fallback | otherwise | base ref |
//!
//! # Degradation
//!
//! Each git query is a [`Probe`]. A failed query is
//! [`Probe::Indeterminate`] and counts as false: a failed ancestry query
//! makes HEAD unmerged (case 1), a failed first-parent or fork-point query
//! moves on to the next case. Every failure is recorded in
//! [`Resolution::degraded`]. When the remote default ref itself does not
//! resolve, cases 1 to 3 cannot match. Only an unresolvable HEAD is fatal.

use crate::core::config::GitConfig;
use crate::core::types::{Oid, Revision};
use crate::git::{GitError, GitHistory};

use super::{GitStateError, SelectError};

/// Tri-state outcome of a git query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Yes,
    No,
    /// The query failed; carries the failure message.
    Indeterminate(String),
}

impl Probe {
    /// Classify a boolean query result.
    pub fn from_result(result: Result<bool, GitError>) -> Self {
        match result {
            Ok(true) => Probe::Yes,
            Ok(false) => Probe::No,
            Err(e) => Probe::Indeterminate(e.to_string()),
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Probe::Yes)
    }

    pub fn is_no(&self) -> bool {
        matches!(self, Probe::No)
    }
}

/// The decision-table row that produced a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseCase {
    PendingUnmerged,
    PendingEmptyBranch,
    DeployedLatest,
    DeployedHistoric,
    HistoricMergedBranch,
    Fallback,
}

impl std::fmt::Display for BaseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BaseCase::PendingUnmerged => "pending-unmerged",
            BaseCase::PendingEmptyBranch => "pending-empty-branch",
            BaseCase::DeployedLatest => "deployed-latest",
            BaseCase::DeployedHistoric => "deployed-historic",
            BaseCase::HistoricMergedBranch => "historic-merged-branch",
            BaseCase::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Git state captured once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSnapshot {
    /// Commit HEAD points at.
    pub head: Oid,
    /// Local commit of the remote default branch ref, if it resolves.
    pub remote_default: Option<Oid>,
}

impl GitSnapshot {
    /// Resolve HEAD and the remote default branch ref.
    ///
    /// # Errors
    ///
    /// [`GitStateError::Unresolvable`] if HEAD does not resolve (for example
    /// in a repository without commits).
    pub fn capture(git: &dyn GitHistory, config: &GitConfig) -> Result<Self, SelectError> {
        let head = git
            .rev_parse("HEAD")
            .map_err(|source| GitStateError::Unresolvable {
                rev: "HEAD".to_string(),
                source,
            })?;

        let remote_ref = config.remote_default_branch_ref();
        let remote_default = match git.rev_parse(&remote_ref) {
            Ok(oid) => Some(oid),
            Err(err) => {
                tracing::debug!(remote_ref = %remote_ref, error = %err, "remote default ref does not resolve");
                None
            }
        };

        Ok(Self {
            head,
            remote_default,
        })
    }
}

/// Outcome of baseline resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Revision to diff HEAD against.
    pub revision: Revision,
    /// Row of the decision table that matched.
    pub case: BaseCase,
    /// Probe failures observed on the way, in evaluation order.
    pub degraded: Vec<String>,
}

/// Picks the baseline revision for change detection.
pub struct RevisionResolver<'a> {
    git: &'a dyn GitHistory,
    config: &'a GitConfig,
}

impl<'a> RevisionResolver<'a> {
    pub fn new(git: &'a dyn GitHistory, config: &'a GitConfig) -> Self {
        Self { git, config }
    }

    /// Capture a snapshot and resolve against it.
    pub fn resolve(&self) -> Result<Resolution, SelectError> {
        let snapshot = GitSnapshot::capture(self.git, self.config)?;
        Ok(self.resolve_with(&snapshot))
    }

    /// Resolve against an already captured snapshot.
    pub fn resolve_with(&self, snapshot: &GitSnapshot) -> Resolution {
        let remote_ref = self.config.remote_default_branch_ref();
        let base_ref = Revision::Symbolic(self.config.default_branch_base_ref.clone());
        let mut degraded = Vec::new();

        let at_remote_default = match &snapshot.remote_default {
            Some(oid) if *oid == snapshot.head => Probe::Yes,
            Some(_) => Probe::No,
            None => Probe::Indeterminate(format!("{} does not resolve", remote_ref)),
        };
        note(&mut degraded, "remote default commit", &at_remote_default);

        let head_is_ancestor = self.probe(&mut degraded, "is-ancestor", || {
            self.git.is_ancestor("HEAD", &remote_ref)
        });

        let decide = |case: BaseCase, revision: Revision, degraded: Vec<String>| {
            tracing::debug!(
                action = "resolve_base_revision",
                head = %snapshot.head.short(8),
                remote_ref = %remote_ref,
                case = %case,
                revision = %revision,
                degraded = degraded.len(),
                "resolved baseline revision"
            );
            Resolution {
                revision,
                case,
                degraded,
            }
        };

        if at_remote_default.is_no() && !head_is_ancestor.is_yes() {
            return decide(
                BaseCase::PendingUnmerged,
                Revision::Symbolic(remote_ref.clone()),
                degraded,
            );
        }

        if at_remote_default.is_yes() {
            let on_default_branch = match self.git.current_branch() {
                Ok(branch) => branch == self.config.default_branch,
                Err(GitError::DetachedHead) => false,
                Err(e) => {
                    degraded.push(format!("current branch: {}", e));
                    false
                }
            };

            return if on_default_branch {
                decide(BaseCase::DeployedLatest, base_ref, degraded)
            } else {
                decide(
                    BaseCase::PendingEmptyBranch,
                    Revision::Symbolic(remote_ref.clone()),
                    degraded,
                )
            };
        }

        // HEAD must lie on the first-parent chain of the remote ref, not the reverse.
        let first_parent = self.probe(&mut degraded, "is-first-parent-ancestor", || {
            self.git.is_first_parent_ancestor("HEAD", &remote_ref)
        });
        if first_parent.is_yes() {
            return decide(BaseCase::DeployedHistoric, base_ref, degraded);
        }

        match self.git.find_fork_point(&remote_ref, "HEAD") {
            Ok(Some(fork_point)) => {
                return decide(
                    BaseCase::HistoricMergedBranch,
                    Revision::Commit(fork_point),
                    degraded,
                );
            }
            Ok(None) => {}
            Err(e) => degraded.push(format!("fork-point: {}", e)),
        }

        decide(BaseCase::Fallback, base_ref, degraded)
    }

    fn probe(
        &self,
        degraded: &mut Vec<String>,
        what: &str,
        query: impl FnOnce() -> Result<bool, GitError>,
    ) -> Probe {
        let probe = Probe::from_result(query());
        note(degraded, what, &probe);
        probe
    }
}

fn note(degraded: &mut Vec<String>, what: &str, probe: &Probe) {
    if let Probe::Indeterminate(reason) = probe {
        tracing::debug!(probe = what, reason = %reason, "git probe failed; degrading");
        degraded.push(format!("{}: {}", what, reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BranchName;
    use crate::git::mock::{label_oid, MockHistory, MockOp};

    fn config() -> GitConfig {
        GitConfig::default()
    }

    fn resolve(git: &MockHistory) -> Resolution {
        RevisionResolver::new(git, &config()).resolve().unwrap()
    }

    /// a - b - c   (origin/main, main)
    fn linear() -> MockHistory {
        MockHistory::new()
            .commit("a", &[])
            .commit("b", &["a"])
            .commit("c", &["b"])
            .set_ref("origin/main", "c")
    }

    #[test]
    fn probe_classification() {
        assert_eq!(Probe::from_result(Ok(true)), Probe::Yes);
        assert_eq!(Probe::from_result(Ok(false)), Probe::No);
        let failed = Probe::from_result(Err(GitError::DetachedHead));
        assert!(!failed.is_yes() && !failed.is_no());
    }

    mod cases {
        use super::*;

        #[test]
        fn pending_unmerged_commit() {
            let git = linear().commit("f", &["c"]).head("f").on_branch("feature");
            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::PendingUnmerged);
            assert_eq!(res.revision, Revision::Symbolic("origin/main".into()));
            assert!(res.degraded.is_empty());
        }

        #[test]
        fn pending_empty_branch() {
            let git = linear().head("c").on_branch("feature");
            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::PendingEmptyBranch);
            assert_eq!(res.revision, Revision::Symbolic("origin/main".into()));
        }

        #[test]
        fn detached_at_remote_default_is_pending() {
            let git = linear().head("c").detached();
            assert_eq!(resolve(&git).case, BaseCase::PendingEmptyBranch);
        }

        #[test]
        fn deployed_latest() {
            let git = linear().head("c").on_branch("main");
            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::DeployedLatest);
            assert_eq!(res.revision, Revision::Symbolic("HEAD^".into()));
        }

        #[test]
        fn deployed_historic() {
            let git = linear().head("b").on_branch("main");
            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::DeployedHistoric);
            assert_eq!(res.revision, Revision::Symbolic("HEAD^".into()));
        }

        /// a - b ----- m   (origin/main)
        ///      \     /
        ///       f1-f2
        #[test]
        fn historic_merged_branch() {
            let git = MockHistory::new()
                .commit("a", &[])
                .commit("b", &["a"])
                .commit("f1", &["b"])
                .commit("f2", &["f1"])
                .commit("m", &["b", "f2"])
                .set_ref("origin/main", "m")
                .reflog("origin/main", &["m", "b", "a"])
                .head("f1")
                .detached();

            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::HistoricMergedBranch);
            assert_eq!(res.revision, Revision::Commit(label_oid("b")));
        }

        #[test]
        fn fallback_without_fork_point() {
            let git = MockHistory::new()
                .commit("a", &[])
                .commit("f1", &["a"])
                .commit("m", &["a", "f1"])
                .set_ref("origin/main", "m")
                .reflog("origin/main", &["m"])
                .head("f1");

            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::Fallback);
            assert_eq!(res.revision, Revision::Symbolic("HEAD^".into()));
        }

        #[test]
        fn custom_config_is_honoured() {
            let git = linear()
                .set_ref("upstream/trunk", "c")
                .head("c")
                .on_branch("trunk");
            let cfg = GitConfig {
                default_remote: "upstream".into(),
                default_branch: BranchName::new("trunk").unwrap(),
                default_branch_base_ref: "HEAD~1".into(),
                check_remote: true,
            };

            let res = RevisionResolver::new(&git, &cfg).resolve().unwrap();
            assert_eq!(res.case, BaseCase::DeployedLatest);
            assert_eq!(res.revision, Revision::Symbolic("HEAD~1".into()));
        }
    }

    mod degradation {
        use super::*;

        /// a - b - c   (origin/main)
        ///  \
        ///   x         (feature)
        #[test]
        fn failed_ancestry_probe_counts_as_unmerged() {
            let git = linear()
                .commit("x", &["a"])
                .head("x")
                .on_branch("feature")
                .reflog("origin/main", &["c", "b", "a"])
                .fail(MockOp::IsAncestor);

            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::PendingUnmerged);
            assert_eq!(res.revision, Revision::Symbolic("origin/main".into()));
            assert_eq!(res.degraded.len(), 1);
            assert!(res.degraded[0].starts_with("is-ancestor"));
        }

        #[test]
        fn later_probes_failing_fall_back() {
            let git = linear()
                .head("b")
                .on_branch("main")
                .fail(MockOp::IsFirstParentAncestor)
                .fail(MockOp::FindForkPoint);

            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::Fallback);
            assert_eq!(res.revision, Revision::Symbolic("HEAD^".into()));
            assert_eq!(res.degraded.len(), 2);
        }

        #[test]
        fn missing_remote_ref_ignores_failed_ancestry() {
            let git = MockHistory::new()
                .commit("a", &[])
                .head("a")
                .on_branch("feature")
                .fail(MockOp::IsAncestor);

            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::Fallback);
            assert_eq!(res.revision, Revision::Symbolic("HEAD^".into()));
        }

        #[test]
        fn missing_remote_ref_falls_back() {
            let git = MockHistory::new().commit("a", &[]).head("a").on_branch("main");

            let res = resolve(&git);
            assert_eq!(res.case, BaseCase::Fallback);
            assert!(!res.degraded.is_empty());
        }

        #[test]
        fn unresolvable_head_is_fatal() {
            let git = linear();
            let err = RevisionResolver::new(&git, &config()).resolve().unwrap_err();
            assert!(matches!(
                err,
                SelectError::GitState(GitStateError::Unresolvable { .. })
            ));
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let git = linear().commit("f", &["c"]).head("f");
        assert_eq!(resolve(&git), resolve(&git));
    }
}
