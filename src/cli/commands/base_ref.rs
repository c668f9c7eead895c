//! base-ref command - Print the change detection baseline

use super::{report_warnings, working_dir};
use crate::core::project::Project;
use crate::engine::{Context, GitSnapshot, RemoteConsistencyChecker, RevisionResolver};
use crate::ui::output;
use anyhow::{bail, Result};

/// Verify the repository state and print the baseline revision.
pub fn base_ref(ctx: &Context) -> Result<()> {
    let (project, warnings) = Project::open(&working_dir(ctx)?)?;
    report_warnings(&warnings);

    let Some(git) = project.git() else {
        bail!("base-ref requires a git repository");
    };
    let config = project.config.git();

    let snapshot = GitSnapshot::capture(git, &config)?;
    if config.check_remote {
        RemoteConsistencyChecker::new(git, &config).check(&snapshot.head)?;
    } else {
        tracing::debug!("remote checks disabled by git.check_remote");
    }

    let line = match &ctx.git_change_base {
        Some(rev) => rev.clone(),
        None => {
            let resolution = RevisionResolver::new(git, &config).resolve_with(&snapshot);
            for reason in &resolution.degraded {
                tracing::warn!(reason = %reason, "baseline probe failed");
            }
            tracing::debug!(case = %resolution.case, revision = %resolution.revision, "resolved baseline");
            resolution.revision.to_string()
        }
    };

    output::print_lines(&[line])?;
    Ok(())
}
