//! engine::selector
//!
//! The selection pipeline.
//!
//! ```text
//! discovery -> scope -> TagFilter -> [CloudHealthFilter] -> sort by path
//! ```
//!
//! Preconditions of the health filter (accepted status value, hosted
//! repository) are checked when the selector is built, before any stack is
//! read or any request is sent. A fatal error yields no partial result.

use crate::cloud::{NormalizedRepo, StatusSource};
use crate::core::stack::Stack;
use crate::core::types::{StackPath, Tag};

use super::health::{CloudHealthFilter, StatusFilter};
use super::tags::TagFilter;
use super::SelectError;

/// Parsed filter flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub tags: TagFilter,
    pub status: Option<StatusFilter>,
}

impl SelectionCriteria {
    /// Parse raw flag values.
    ///
    /// Tag values may be repeated or comma-separated.
    ///
    /// # Errors
    ///
    /// [`SelectError::Configuration`] for an invalid tag or a status value
    /// other than `unhealthy`.
    pub fn parse<S: AsRef<str>>(
        tags: &[S],
        no_tags: &[S],
        status: Option<&str>,
    ) -> Result<Self, SelectError> {
        let status = status.map(str::parse::<StatusFilter>).transpose()?;
        let include = parse_tags("--tags", tags)?;
        let exclude = parse_tags("--no-tags", no_tags)?;

        Ok(Self {
            tags: TagFilter::new(include, exclude),
            status,
        })
    }
}

fn parse_tags<S: AsRef<str>>(flag: &str, values: &[S]) -> Result<Vec<Tag>, SelectError> {
    values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            Tag::new(v).map_err(|e| SelectError::Configuration(format!("{}: {}", flag, e)))
        })
        .collect()
}

/// Selected stacks, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResult {
    pub stacks: Vec<Stack>,
}

impl SelectionResult {
    /// Project-absolute paths of the selected stacks.
    pub fn paths(&self) -> Vec<&StackPath> {
        self.stacks.iter().map(|s| &s.path).collect()
    }

    /// Paths relative to `dir` (`.` for `dir` itself); stacks outside `dir`
    /// are skipped.
    pub fn relative_paths(&self, dir: &StackPath) -> Vec<String> {
        self.stacks
            .iter()
            .filter_map(|s| s.path.relative_to(dir))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

/// Orchestrates the filters over a stack inventory.
#[derive(Debug)]
pub struct StackSelector<'a> {
    criteria: &'a SelectionCriteria,
    repo: &'a NormalizedRepo,
    scope: StackPath,
}

impl<'a> StackSelector<'a> {
    /// Build a selector for the repository `repo`.
    ///
    /// # Errors
    ///
    /// [`SelectError::UnsupportedRemote`] if a status filter is requested for
    /// a filesystem based (or absent) remote.
    pub fn new(criteria: &'a SelectionCriteria, repo: &'a NormalizedRepo) -> Result<Self, SelectError> {
        if criteria.status.is_some() && repo.is_local() {
            return Err(SelectError::UnsupportedRemote);
        }
        Ok(Self {
            criteria,
            repo,
            scope: StackPath::root(),
        })
    }

    /// Only consider stacks at or below `dir`.
    pub fn scoped_to(mut self, dir: StackPath) -> Self {
        self.scope = dir;
        self
    }

    /// Whether [`select`](Self::select) needs a status source.
    pub fn needs_status(&self) -> bool {
        self.criteria.status.is_some()
    }

    /// Run the pipeline over `stacks`.
    ///
    /// `source` is only consulted when a status filter is set.
    ///
    /// # Errors
    ///
    /// - [`SelectError::Configuration`] if a status filter is set without a source
    /// - [`SelectError::Network`] if fetching statuses fails
    pub async fn select(
        &self,
        stacks: Vec<Stack>,
        source: Option<&dyn StatusSource>,
    ) -> Result<SelectionResult, SelectError> {
        let total = stacks.len();
        let scoped: Vec<Stack> = stacks
            .into_iter()
            .filter(|s| s.path.is_within(&self.scope))
            .collect();
        let mut selected = self.criteria.tags.apply(scoped);

        if let Some(StatusFilter::Unhealthy) = self.criteria.status {
            let source = source.ok_or_else(|| {
                SelectError::Configuration("status filter requires a cloud status source".into())
            })?;
            let repo = self.repo.as_remote().ok_or(SelectError::UnsupportedRemote)?;

            let records = source.stack_statuses().await?;
            selected = CloudHealthFilter::new(repo, records).unhealthy(selected);
        }

        selected.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(
            scope = %self.scope,
            total,
            selected = selected.len(),
            "selected stacks"
        );

        Ok(SelectionResult { stacks: selected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::mock::MockCloud;
    use crate::cloud::{CloudError, StackStatus};
    use crate::core::types::MetaId;

    const REPO: &str = "github.com/terramate-io/terramate";

    fn hosted() -> NormalizedRepo {
        NormalizedRepo::Remote(REPO.to_string())
    }

    fn stack(path: &str, id: Option<&str>, tags: &[&str]) -> Stack {
        let mut stack = Stack::new(StackPath::new(path).unwrap())
            .with_tags(tags.iter().map(|t| Tag::new(*t).unwrap()));
        if let Some(id) = id {
            stack = stack.with_id(MetaId::new(id).unwrap());
        }
        stack
    }

    fn unhealthy() -> SelectionCriteria {
        SelectionCriteria::parse::<&str>(&[], &[], Some("unhealthy")).unwrap()
    }

    fn paths(result: &SelectionResult) -> Vec<&str> {
        result.stacks.iter().map(|s| s.path.as_str()).collect()
    }

    mod criteria {
        use super::*;

        #[test]
        fn comma_separated_and_repeated_tags() {
            let c = SelectionCriteria::parse(&["prod,aws", "eu"], &["legacy"], None).unwrap();
            assert!(c.tags.matches(
                &["prod", "aws", "eu"]
                    .iter()
                    .map(|t| Tag::new(*t).unwrap())
                    .collect()
            ));
            assert!(c.status.is_none());
        }

        #[test]
        fn invalid_tag_is_configuration_error() {
            let err = SelectionCriteria::parse(&["Prod"], &[], None).unwrap_err();
            assert!(matches!(err, SelectError::Configuration(_)));
            assert!(err.to_string().contains("--tags"));
        }

        #[test]
        fn status_value_is_validated() {
            let err = SelectionCriteria::parse::<&str>(&[], &[], Some("drifted")).unwrap_err();
            assert!(err.to_string().contains("only unhealthy filter allowed"));
        }
    }

    #[test]
    fn status_filter_rejects_local_repository() {
        let criteria = unhealthy();
        let err = StackSelector::new(&criteria, &NormalizedRepo::Local).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unhealthy status filter does not work with filesystem based remotes"
        );
    }

    #[test]
    fn local_repository_without_status_filter_is_fine() {
        let criteria = SelectionCriteria::default();
        assert!(StackSelector::new(&criteria, &NormalizedRepo::Local).is_ok());
    }

    #[tokio::test]
    async fn no_filters_lists_sorted() {
        let criteria = SelectionCriteria::default();
        let repo = hosted();
        let selector = StackSelector::new(&criteria, &repo).unwrap();

        let result = selector
            .select(vec![stack("/s2", None, &[]), stack("/s1", None, &[])], None)
            .await
            .unwrap();
        assert_eq!(paths(&result), vec!["/s1", "/s2"]);
    }

    #[tokio::test]
    async fn unfiltered_listing_does_not_fetch() {
        let criteria = SelectionCriteria::default();
        let repo = hosted();
        let cloud = MockCloud::new();

        StackSelector::new(&criteria, &repo)
            .unwrap()
            .select(vec![stack("/s1", None, &[])], Some(&cloud))
            .await
            .unwrap();
        assert_eq!(cloud.fetch_count(), 0);
    }

    #[tokio::test]
    async fn unhealthy_matching_repository() {
        let criteria = unhealthy();
        let repo = hosted();
        let cloud = MockCloud::new().with_stack("s1", REPO, StackStatus::Failed);

        let result = StackSelector::new(&criteria, &repo)
            .unwrap()
            .select(
                vec![stack("/s1", Some("s1"), &[]), stack("/s2", Some("s2"), &[])],
                Some(&cloud),
            )
            .await
            .unwrap();
        assert_eq!(paths(&result), vec!["/s1"]);
    }

    #[tokio::test]
    async fn unhealthy_other_repository() {
        let criteria = unhealthy();
        let repo = hosted();
        let cloud =
            MockCloud::new().with_stack("s1", "gitlab.com/unknown-io/other", StackStatus::Failed);

        let result = StackSelector::new(&criteria, &repo)
            .unwrap()
            .select(vec![stack("/s1", Some("s1"), &[])], Some(&cloud))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn tags_apply_before_health() {
        let criteria = SelectionCriteria::parse(&["prod"], &[], Some("unhealthy")).unwrap();
        let repo = hosted();
        let cloud = MockCloud::new()
            .with_stack("s1", REPO, StackStatus::Failed)
            .with_stack("s2", REPO, StackStatus::Drifted);

        let result = StackSelector::new(&criteria, &repo)
            .unwrap()
            .select(
                vec![
                    stack("/s1", Some("s1"), &["prod"]),
                    stack("/s2", Some("s2"), &["dev"]),
                ],
                Some(&cloud),
            )
            .await
            .unwrap();
        assert_eq!(paths(&result), vec!["/s1"]);
    }

    #[tokio::test]
    async fn scope_limits_stacks() {
        let criteria = SelectionCriteria::default();
        let repo = hosted();
        let selector = StackSelector::new(&criteria, &repo)
            .unwrap()
            .scoped_to(StackPath::new("/infra").unwrap());

        let result = selector
            .select(
                vec![
                    stack("/infra", None, &[]),
                    stack("/infra/net", None, &[]),
                    stack("/infrastructure", None, &[]),
                    stack("/apps", None, &[]),
                ],
                None,
            )
            .await
            .unwrap();

        let dir = StackPath::new("/infra").unwrap();
        assert_eq!(result.relative_paths(&dir), vec![".", "net"]);
    }

    #[tokio::test]
    async fn network_failure_is_fatal() {
        let criteria = unhealthy();
        let repo = hosted();
        let cloud = MockCloud::new().failing(CloudError::Timeout {
            url: "https://api.example.com/v1/stacks".into(),
        });

        let err = StackSelector::new(&criteria, &repo)
            .unwrap()
            .select(vec![stack("/s1", Some("s1"), &[])], Some(&cloud))
            .await
            .unwrap_err();
        assert!(matches!(err, SelectError::Network(_)));
    }

    #[tokio::test]
    async fn status_filter_without_source() {
        let criteria = unhealthy();
        let repo = hosted();
        let err = StackSelector::new(&criteria, &repo)
            .unwrap()
            .select(vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(err, SelectError::Configuration(_)));
    }
}
