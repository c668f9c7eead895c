//! list command - Print the selected stacks

use super::{report_warnings, working_dir};
use crate::auth;
use crate::cloud::{CloudClient, StatusSource};
use crate::core::project::Project;
use crate::core::stack::{self, Stack};
use crate::engine::{Context, SelectionCriteria, SelectionResult, StackSelector};
use crate::ui::output;
use anyhow::Result;

/// List stacks below the working directory that pass the filters.
pub fn list(
    ctx: &Context,
    tags: &[String],
    no_tags: &[String],
    status: Option<&str>,
) -> Result<()> {
    let criteria = SelectionCriteria::parse(tags, no_tags, status)?;

    let (project, warnings) = Project::open(&working_dir(ctx)?)?;
    report_warnings(&warnings);

    let repo = project.normalized_repo();
    let wd = project.wd_path()?;
    let selector = StackSelector::new(&criteria, &repo)?.scoped_to(wd.clone());

    let stacks = stack::discover(&project.root)?;
    tracing::debug!(root = %project.root.display(), stacks = stacks.len(), "discovered stacks");

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(list_async(&project, &selector, stacks))?;

    output::print_lines(&result.relative_paths(&wd))?;
    Ok(())
}

async fn list_async(
    project: &Project,
    selector: &StackSelector<'_>,
    stacks: Vec<Stack>,
) -> Result<SelectionResult> {
    if !selector.needs_status() {
        return Ok(selector.select(stacks, None).await?);
    }

    let credential = auth::load_credential().await?;
    let client = CloudClient::new(project.config.cloud_api_url(), credential)?
        .with_organization(project.config.cloud_organization());
    let source: &dyn StatusSource = &client;

    Ok(selector.select(stacks, Some(source)).await?)
}
