//! engine::health
//!
//! Cloud health classification of local stacks.
//!
//! # Matching
//!
//! Records are matched to stacks by `meta_id`, and only records of the
//! current repository take part. A stack is unhealthy iff a matching record
//! exists and its status is not `ok`. Stacks without an id, and stacks
//! without a record, are never unhealthy.

use std::collections::HashMap;
use std::str::FromStr;

use crate::cloud::{RemoteStackStatus, StackStatus};
use crate::core::stack::Stack;

use super::SelectError;

/// Accepted values of the status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Unhealthy,
}

impl FromStr for StatusFilter {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unhealthy" => Ok(StatusFilter::Unhealthy),
            other => Err(SelectError::Configuration(format!(
                "only unhealthy filter allowed, got {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::Unhealthy => f.write_str("unhealthy"),
        }
    }
}

/// Health of a single stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// The stack declares no id and cannot be matched.
    Unidentified,
    /// No record of this repository carries the stack's id.
    NoRecord,
    Healthy,
    /// The matching record reports this non-ok status.
    Unhealthy(StackStatus),
}

/// Classifies stacks against the records of one repository.
#[derive(Debug, Clone, Default)]
pub struct CloudHealthFilter {
    by_meta_id: HashMap<String, RemoteStackStatus>,
}

impl CloudHealthFilter {
    /// Index `records` belonging to `repository` by `meta_id`.
    ///
    /// Records of other repositories, and records without an id, are
    /// dropped. If several records share an id the last one wins.
    pub fn new(repository: &str, records: impl IntoIterator<Item = RemoteStackStatus>) -> Self {
        let mut dropped = 0usize;
        let mut by_meta_id = HashMap::new();

        for record in records {
            if record.repository != repository || record.meta_id.is_empty() {
                dropped += 1;
                continue;
            }
            by_meta_id.insert(record.meta_id.clone(), record);
        }

        tracing::debug!(
            repository,
            matched = by_meta_id.len(),
            dropped,
            "indexed cloud stack records"
        );
        Self { by_meta_id }
    }

    /// Classify one stack.
    pub fn classify(&self, stack: &Stack) -> Health {
        let Some(id) = &stack.meta_id else {
            return Health::Unidentified;
        };
        match self.by_meta_id.get(id.as_str()) {
            None => Health::NoRecord,
            Some(record) if record.status.is_ok() => Health::Healthy,
            Some(record) => Health::Unhealthy(record.status),
        }
    }

    /// Keep the unhealthy stacks, preserving order.
    pub fn unhealthy(&self, stacks: Vec<Stack>) -> Vec<Stack> {
        stacks
            .into_iter()
            .filter(|s| matches!(self.classify(s), Health::Unhealthy(_)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MetaId, StackPath};

    const REPO: &str = "github.com/terramate-io/terramate";

    fn stack(path: &str, id: Option<&str>) -> Stack {
        let stack = Stack::new(StackPath::new(path).unwrap());
        match id {
            Some(id) => stack.with_id(MetaId::new(id).unwrap()),
            None => stack,
        }
    }

    fn record(meta_id: &str, repository: &str, status: StackStatus) -> RemoteStackStatus {
        RemoteStackStatus {
            stack_id: 1,
            meta_id: meta_id.to_string(),
            repository: repository.to_string(),
            path: String::new(),
            status,
            deployment_status: None,
            drift_status: None,
        }
    }

    mod status_filter {
        use super::*;

        #[test]
        fn only_unhealthy_parses() {
            assert_eq!(
                "unhealthy".parse::<StatusFilter>().unwrap(),
                StatusFilter::Unhealthy
            );
            for value in ["drifted", "ok", "Unhealthy", ""] {
                let err = value.parse::<StatusFilter>().unwrap_err();
                assert!(err.to_string().contains("only unhealthy filter allowed"));
            }
        }
    }

    #[test]
    fn classification() {
        let filter = CloudHealthFilter::new(
            REPO,
            [
                record("ok", REPO, StackStatus::Ok),
                record("failed", REPO, StackStatus::Failed),
                record("drifted", REPO, StackStatus::Drifted),
                record("odd", REPO, StackStatus::Unrecognized),
            ],
        );

        assert_eq!(filter.classify(&stack("/a", None)), Health::Unidentified);
        assert_eq!(filter.classify(&stack("/a", Some("none"))), Health::NoRecord);
        assert_eq!(filter.classify(&stack("/a", Some("ok"))), Health::Healthy);
        assert_eq!(
            filter.classify(&stack("/a", Some("failed"))),
            Health::Unhealthy(StackStatus::Failed)
        );
        assert_eq!(
            filter.classify(&stack("/a", Some("drifted"))),
            Health::Unhealthy(StackStatus::Drifted)
        );
        assert_eq!(
            filter.classify(&stack("/a", Some("odd"))),
            Health::Unhealthy(StackStatus::Unrecognized)
        );
    }

    #[test]
    fn other_repositories_never_match() {
        let filter = CloudHealthFilter::new(
            REPO,
            [record("s1", "gitlab.com/unknown-io/other", StackStatus::Failed)],
        );
        assert_eq!(filter.classify(&stack("/s1", Some("s1"))), Health::NoRecord);
    }

    #[test]
    fn unhealthy_keeps_order_and_skips_unidentified() {
        let filter = CloudHealthFilter::new(
            REPO,
            [
                record("s1", REPO, StackStatus::Failed),
                record("s2", REPO, StackStatus::Drifted),
                record("s3", REPO, StackStatus::Ok),
            ],
        );
        let stacks = vec![
            stack("/s2", Some("s2")),
            stack("/stack-without-id", None),
            stack("/s1", Some("s1")),
            stack("/s3", Some("s3")),
        ];

        let kept = filter.unhealthy(stacks);
        let paths: Vec<_> = kept.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["/s2", "/s1"]);
    }

    #[test]
    fn empty_meta_id_records_are_ignored() {
        let filter = CloudHealthFilter::new(REPO, [record("", REPO, StackStatus::Failed)]);
        assert_eq!(filter.classify(&stack("/a", None)), Health::Unidentified);
    }
}
