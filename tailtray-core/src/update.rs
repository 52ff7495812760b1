//! Git based self-update
//!
//! Pulls the checkout the application runs from and reports the commits
//! that came in. Failures only skip the update.

use crate::error::UpdateError;
use crate::process::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of an update attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// HEAD moved; a restart picks up the new version
    Updated { changelog: String },

    /// Nothing new was pulled
    UpToDate,
}

/// Updates a git checkout with `git pull --rebase`
pub struct Updater {
    runner: Arc<dyn CommandRunner>,
    repo_dir: Option<PathBuf>,
    git: String,
}

impl Updater {
    pub fn new(runner: Arc<dyn CommandRunner>, repo_dir: Option<PathBuf>) -> Self {
        Self {
            runner,
            repo_dir,
            git: "git".to_string(),
        }
    }

    /// Use a specific git binary
    pub fn with_git(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    /// Pull the checkout and report what changed
    pub async fn auto_update(&self) -> Result<UpdateOutcome, UpdateError> {
        let repo_dir = self.repo_dir.clone().ok_or(UpdateError::NoRepository)?;
        which::which(&self.git).map_err(|_| UpdateError::GitUnavailable)?;

        let before = self.read_head(&repo_dir).await?;
        debug!("Revision before update: {}", before);

        let pull = self.git(["pull", "--rebase"])?.in_dir(&repo_dir);
        let result = self.runner.run(&pull).await?;
        if !result.success() {
            warn!("Unable to self-update via git pull --rebase");
            return Err(UpdateError::PullFailed {
                code: result.exit_code,
            });
        }

        let after = self.read_head(&repo_dir).await?;
        if before == after {
            info!("Already up to date at {}", after);
            return Ok(UpdateOutcome::UpToDate);
        }

        let changelog = self.read_changelog(&repo_dir, &before, &after).await?;
        info!("Updated {} -> {}, changelog:\n{}", before, after, changelog);
        Ok(UpdateOutcome::Updated { changelog })
    }

    async fn read_head(&self, repo_dir: &Path) -> Result<String, UpdateError> {
        let invocation = self.git(["rev-parse", "HEAD"])?.in_dir(repo_dir).quiet();
        let result = self.runner.run(&invocation).await?;
        if !result.success() {
            return Err(UpdateError::RevisionUnavailable);
        }
        result
            .lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .find(|line| !line.is_empty())
            .ok_or(UpdateError::RevisionUnavailable)
    }

    async fn read_changelog(
        &self,
        repo_dir: &Path,
        before: &str,
        after: &str,
    ) -> Result<String, UpdateError> {
        let range = format!("{}..{}", before, after);
        let invocation = self
            .git(["log", range.as_str(), "--pretty=format:%an <%ae> %s"])?
            .in_dir(repo_dir)
            .quiet();
        let result = self.runner.run(&invocation).await?;
        if !result.success() {
            warn!("git log exited with code {}", result.exit_code);
        }
        Ok(result.lines.join("\n"))
    }

    fn git<'a>(&'a self, args: impl IntoIterator<Item = &'a str>) -> Result<Invocation, UpdateError> {
        let argv = std::iter::once(self.git.as_str()).chain(args);
        Ok(Invocation::new(argv)?)
    }
}
