//! Property-based tests for the selection pipeline.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated stack layouts and cloud records.

use std::collections::BTreeMap;

use proptest::prelude::*;

use stackpick::cloud::mock::MockCloud;
use stackpick::cloud::{
    normalize_git_uri, NormalizedRepo, RemoteStackStatus, StackStatus, StatusSource,
};
use stackpick::core::stack::Stack;
use stackpick::core::types::{MetaId, StackPath, Tag};
use stackpick::engine::{CloudHealthFilter, SelectionCriteria, StackSelector, TagFilter};

const REPO: &str = "github.com/terramate-io/terramate";
const OTHER_REPO: &str = "github.com/terramate-io/other";
const TAGS: &[&str] = &["prod", "dev", "aws", "legacy"];
const IDS: &[&str] = &["s1", "s2", "s3", "s4", "s5", "s6"];

/// Strategy for project-absolute stack paths.
fn stack_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,5}", 1..4).prop_map(|parts| format!("/{}", parts.join("/")))
}

fn tag_set() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(TAGS, 0..=TAGS.len())
}

/// Strategy for a stack layout with unique paths.
fn stacks() -> impl Strategy<Value = Vec<Stack>> {
    prop::collection::btree_map(
        stack_path(),
        (prop::option::of(prop::sample::select(IDS)), tag_set()),
        0..12,
    )
    .prop_map(|layout: BTreeMap<String, (Option<&str>, Vec<&str>)>| {
        layout
            .into_iter()
            .map(|(path, (id, tags))| {
                let mut stack = Stack::new(StackPath::new(path).unwrap())
                    .with_tags(tags.into_iter().map(|t| Tag::new(t).unwrap()));
                if let Some(id) = id {
                    stack = stack.with_id(MetaId::new(id).unwrap());
                }
                stack
            })
            .collect()
    })
}

fn status() -> impl Strategy<Value = StackStatus> {
    prop_oneof![
        Just(StackStatus::Ok),
        Just(StackStatus::Failed),
        Just(StackStatus::Drifted),
        Just(StackStatus::Unknown),
    ]
}

fn records(repository: &'static str) -> impl Strategy<Value = Vec<RemoteStackStatus>> {
    prop::collection::vec((prop::sample::select(IDS), status()), 0..8).prop_map(move |items| {
        items
            .into_iter()
            .enumerate()
            .map(|(n, (id, status))| RemoteStackStatus {
                stack_id: n as i64,
                meta_id: id.to_string(),
                repository: repository.to_string(),
                path: format!("/{}", id),
                status,
                deployment_status: None,
                drift_status: None,
            })
            .collect()
    })
}

fn select(
    stacks: Vec<Stack>,
    criteria: &SelectionCriteria,
    cloud: &MockCloud,
) -> Vec<String> {
    let repo = NormalizedRepo::Remote(REPO.to_string());
    let selector = StackSelector::new(criteria, &repo).unwrap();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let source: &dyn StatusSource = cloud;
    let result = rt.block_on(selector.select(stacks, Some(source))).unwrap();
    result.paths().iter().map(|p| p.to_string()).collect()
}

fn mock_cloud(records: Vec<RemoteStackStatus>) -> MockCloud {
    records
        .into_iter()
        .fold(MockCloud::new(), |cloud, r| cloud.with_record(r))
}

fn unhealthy() -> SelectionCriteria {
    SelectionCriteria::parse::<&str>(&[], &[], Some("unhealthy")).unwrap()
}

proptest! {
    #[test]
    fn output_is_sorted_and_order_independent(
        stacks in stacks(),
        records in records(REPO),
        seed in any::<u64>(),
    ) {
        let cloud = mock_cloud(records);
        let criteria = unhealthy();

        let mut shuffled = stacks.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();
        }

        let first = select(stacks, &criteria, &cloud);
        let second = select(shuffled, &criteria, &cloud);

        let mut sorted = first.clone();
        sorted.sort();
        prop_assert_eq!(&first, &sorted);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn stacks_without_id_are_never_unhealthy(
        stacks in stacks(),
        records in records(REPO),
    ) {
        let idless: Vec<String> = stacks
            .iter()
            .filter(|s| s.meta_id.is_none())
            .map(|s| s.path.to_string())
            .collect();

        let selected = select(stacks, &unhealthy(), &mock_cloud(records));
        for path in &idless {
            prop_assert!(!selected.contains(path));
        }
    }

    #[test]
    fn unfiltered_listing_keeps_every_stack(stacks in stacks()) {
        let expected: Vec<String> = stacks.iter().map(|s| s.path.to_string()).collect();
        let selected = select(stacks, &SelectionCriteria::default(), &MockCloud::new());
        prop_assert_eq!(selected, expected);
    }

    #[test]
    fn other_repositories_never_affect_health(
        stacks in stacks(),
        ours in records(REPO),
        theirs in records(OTHER_REPO),
    ) {
        let alone = CloudHealthFilter::new(REPO, ours.clone());
        let mixed = CloudHealthFilter::new(REPO, theirs.into_iter().chain(ours));

        for stack in &stacks {
            prop_assert_eq!(alone.classify(stack), mixed.classify(stack));
        }
    }

    #[test]
    fn tag_filter_partitions_stacks(
        stacks in stacks(),
        include in tag_set(),
        exclude in tag_set(),
    ) {
        let filter = TagFilter::new(
            include.iter().map(|t| Tag::new(*t).unwrap()),
            exclude.iter().map(|t| Tag::new(*t).unwrap()),
        );
        let kept = filter.apply(stacks.clone());

        for stack in &stacks {
            let has = |t: &&str| stack.tags.iter().any(|tag| tag.as_str() == *t);
            let expected = include.iter().all(has) && !exclude.iter().any(has);
            prop_assert_eq!(kept.contains(stack), expected);
        }
    }

    #[test]
    fn ssh_and_https_remotes_normalize_alike(
        owner in "[a-z][a-z0-9-]{0,10}",
        repo in "[a-z][a-z0-9_.-]{0,10}",
    ) {
        let repo = repo.trim_end_matches(".git").to_string();
        prop_assume!(!repo.is_empty() && !repo.ends_with('.'));

        let ssh = normalize_git_uri(&format!("git@github.com:{}/{}.git", owner, repo));
        let https = normalize_git_uri(&format!("https://github.com/{}/{}", owner, repo));

        prop_assert_eq!(&ssh, &https);
        prop_assert_eq!(ssh, NormalizedRepo::Remote(format!("github.com/{}/{}", owner, repo)));
    }
}
