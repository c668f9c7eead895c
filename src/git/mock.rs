//! git::mock
//!
//! Scripted [`GitHistory`] for deterministic testing.
//!
//! # Design
//!
//! The mock holds a small commit graph addressed by labels. Labels map to
//! stable fake commit ids via [`label_oid`], so tests can describe a
//! topology and assert on resolved revisions without a real repository.
//! Any operation can be configured to fail, and every call is recorded.
//!
//! # Example
//!
//! ```
//! use stackpick::git::mock::{label_oid, MockHistory};
//! use stackpick::git::GitHistory;
//!
//! let git = MockHistory::new()
//!     .commit("a", &[])
//!     .commit("b", &["a"])
//!     .set_ref("origin/main", "b")
//!     .head("b")
//!     .on_branch("main");
//!
//! assert!(git.is_ancestor("HEAD^", "origin/main").unwrap());
//! assert_eq!(git.rev_parse("HEAD^").unwrap(), label_oid("a"));
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::history::{GitHistory, Remote, RemoteRev};
use super::GitError;
use crate::core::types::{BranchName, Oid};

/// Operations that can be made to fail or be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    RevParse,
    CurrentBranch,
    IsAncestor,
    IsFirstParentAncestor,
    FindForkPoint,
    MergeBase,
    Remotes,
    FetchRemoteRev,
    Url,
}

/// Fake commit id for a label: the label's bytes in hex, left-padded to 40
/// characters.
///
/// # Panics
///
/// Panics if the label is longer than 20 bytes.
pub fn label_oid(label: &str) -> Oid {
    assert!(label.len() <= 20, "mock commit labels are at most 20 bytes");
    let hex: String = label.bytes().map(|b| format!("{:02x}", b)).collect();
    Oid::new(format!("{:0>40}", hex)).expect("hex of at most 40 chars is a valid oid")
}

/// Scripted git history.
#[derive(Debug, Default)]
pub struct MockHistory {
    /// Commit -> parents, first parent first.
    commits: HashMap<Oid, Vec<Oid>>,
    /// Ref name (`HEAD`, `origin/main`, ...) -> commit.
    refs: HashMap<String, Oid>,
    branch: Option<BranchName>,
    remotes: Vec<Remote>,
    advertised: HashMap<(String, String), Oid>,
    reflogs: HashMap<String, Vec<Oid>>,
    urls: HashMap<String, String>,
    fail_on: HashSet<MockOp>,
    calls: Mutex<Vec<MockOp>>,
}

impl MockHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit with the given parent labels (first parent first).
    pub fn commit(mut self, label: &str, parents: &[&str]) -> Self {
        let parents = parents.iter().map(|p| label_oid(p)).collect();
        self.commits.insert(label_oid(label), parents);
        self
    }

    /// Point a ref at a labelled commit.
    pub fn set_ref(mut self, name: &str, label: &str) -> Self {
        self.refs.insert(name.to_string(), label_oid(label));
        self
    }

    /// Point `HEAD` at a labelled commit.
    pub fn head(self, label: &str) -> Self {
        self.set_ref("HEAD", label)
    }

    /// Check out a branch by name.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid branch name.
    pub fn on_branch(mut self, name: &str) -> Self {
        self.branch = Some(BranchName::new(name).expect("valid branch name"));
        self
    }

    /// Detach HEAD.
    pub fn detached(mut self) -> Self {
        self.branch = None;
        self
    }

    /// Configure a remote with known branches.
    pub fn remote(mut self, name: &str, branches: &[&str]) -> Self {
        self.remotes.push(Remote {
            name: name.to_string(),
            branches: branches.iter().map(|b| b.to_string()).collect(),
        });
        self.remotes.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    /// Make `remote` advertise `branch` at a labelled commit.
    pub fn advertise(mut self, remote: &str, branch: &str, label: &str) -> Self {
        self.advertised
            .insert((remote.to_string(), branch.to_string()), label_oid(label));
        self
    }

    /// Set the reflog of a ref, newest entry first.
    pub fn reflog(mut self, name: &str, labels: &[&str]) -> Self {
        self.reflogs
            .insert(name.to_string(), labels.iter().map(|l| label_oid(l)).collect());
        self
    }

    /// Set the URL of a remote.
    pub fn with_url(mut self, remote: &str, url: &str) -> Self {
        self.urls.insert(remote.to_string(), url.to_string());
        self
    }

    /// Make an operation fail.
    pub fn fail(mut self, op: MockOp) -> Self {
        self.fail_on.insert(op);
        self
    }

    /// Operations invoked so far, in order.
    pub fn calls(&self) -> Vec<MockOp> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn enter(&self, op: MockOp) -> Result<(), GitError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(op);
        }
        if self.fail_on.contains(&op) {
            return Err(GitError::Internal {
                message: format!("injected failure: {:?}", op),
            });
        }
        Ok(())
    }

    /// Resolve `name`, `name^` and `name~N` forms.
    fn resolve(&self, rev: &str) -> Result<Oid, GitError> {
        let not_found = || GitError::RevisionNotFound {
            rev: rev.to_string(),
        };

        let (base, hops) = if let Some(base) = rev.strip_suffix('^') {
            (base, 1)
        } else if let Some((base, n)) = rev.rsplit_once('~') {
            (base, n.parse::<usize>().map_err(|_| not_found())?)
        } else {
            (rev, 0)
        };

        let mut oid = match self.refs.get(base) {
            Some(oid) => oid.clone(),
            None => Oid::new(base)
                .ok()
                .filter(|oid| self.commits.contains_key(oid))
                .ok_or_else(not_found)?,
        };

        for _ in 0..hops {
            oid = self.first_parent(&oid).ok_or_else(not_found)?;
        }
        Ok(oid)
    }

    fn first_parent(&self, oid: &Oid) -> Option<Oid> {
        self.commits.get(oid).and_then(|p| p.first().cloned())
    }

    /// All commits reachable from `tip` (inclusive), breadth-first.
    fn reachable(&self, tip: &Oid) -> Vec<Oid> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([tip.clone()]);

        while let Some(oid) = queue.pop_front() {
            if !seen.insert(oid.clone()) {
                continue;
            }
            if let Some(parents) = self.commits.get(&oid) {
                queue.extend(parents.iter().cloned());
            }
            order.push(oid);
        }
        order
    }
}

impl GitHistory for MockHistory {
    fn rev_parse(&self, rev: &str) -> Result<Oid, GitError> {
        self.enter(MockOp::RevParse)?;
        self.resolve(rev)
    }

    fn current_branch(&self) -> Result<BranchName, GitError> {
        self.enter(MockOp::CurrentBranch)?;
        self.branch.clone().ok_or(GitError::DetachedHead)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
        self.enter(MockOp::IsAncestor)?;
        let ancestor = self.resolve(ancestor)?;
        let descendant = self.resolve(descendant)?;
        Ok(self.reachable(&descendant).contains(&ancestor))
    }

    fn is_first_parent_ancestor(
        &self,
        ancestor: &str,
        descendant: &str,
    ) -> Result<bool, GitError> {
        self.enter(MockOp::IsFirstParentAncestor)?;
        let ancestor = self.resolve(ancestor)?;
        let mut current = Some(self.resolve(descendant)?);

        while let Some(oid) = current {
            if oid == ancestor {
                return Ok(true);
            }
            current = self.first_parent(&oid);
        }
        Ok(false)
    }

    fn find_fork_point(&self, upstream: &str, rev: &str) -> Result<Option<Oid>, GitError> {
        self.enter(MockOp::FindForkPoint)?;
        let rev = self.resolve(rev)?;
        let history = self.reachable(&rev);

        let mut candidates = self.reflogs.get(upstream).cloned().unwrap_or_default();
        let current = self.resolve(upstream)?;
        if !candidates.contains(&current) {
            candidates.push(current);
        }

        Ok(candidates.into_iter().find(|c| history.contains(c)))
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<Oid, GitError> {
        self.enter(MockOp::MergeBase)?;
        let a_history: HashSet<Oid> = self.reachable(&self.resolve(a)?).into_iter().collect();

        self.reachable(&self.resolve(b)?)
            .into_iter()
            .find(|oid| a_history.contains(oid))
            .ok_or_else(|| GitError::NoMergeBase {
                a: a.to_string(),
                b: b.to_string(),
            })
    }

    fn remotes(&self) -> Result<Vec<Remote>, GitError> {
        self.enter(MockOp::Remotes)?;
        Ok(self.remotes.clone())
    }

    fn fetch_remote_rev(&self, remote: &str, branch: &str) -> Result<RemoteRev, GitError> {
        self.enter(MockOp::FetchRemoteRev)?;
        if !self.remotes.iter().any(|r| r.name == remote) {
            return Err(GitError::RemoteNotFound {
                name: remote.to_string(),
            });
        }

        self.advertised
            .get(&(remote.to_string(), branch.to_string()))
            .map(|oid| RemoteRev {
                refname: format!("refs/heads/{}", branch),
                commit: oid.clone(),
            })
            .ok_or_else(|| GitError::RemoteBranchNotFound {
                remote: remote.to_string(),
                branch: branch.to_string(),
            })
    }

    fn url(&self, remote: &str) -> Result<String, GitError> {
        self.enter(MockOp::Url)?;
        self.urls
            .get(remote)
            .cloned()
            .ok_or_else(|| GitError::RemoteNotFound {
                name: remote.to_string(),
            })
    }
}
