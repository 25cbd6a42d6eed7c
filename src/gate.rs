//! Merge gate - one PR, end to end
//!
//! Wires the collaborators together for a single pull request:
//! [`MergeGate::validate`] builds the ledger, [`MergeGate::evaluate`] turns
//! it into a verdict, [`MergeGate::evaluate_and_maybe_merge`] merges when the
//! verdict allows. Build status and reviewer comments are posted only on
//! request.

use crate::command::CommandRunner;
use crate::config::{ConfigSource, DEFAULT_MINIMUM_REVIEWERS};
use crate::error::Result;
use crate::integration::{IntegrationRunner, ProgressCallback, ValidationRun};
use crate::merge::{
    EligibilityInput, MergeAttempt, MergeRequest, Verdict, evaluate_eligibility, execute_merge,
};
use crate::platform::PlatformService;
use crate::report::{
    ReviewSummary, render_build_status_comment, render_reviewers_comment, upload_step_outputs,
};
use crate::review::{ReviewComment, ReviewPolicy, qualifying_reviews};
use crate::settings::Settings;
use crate::types::PullRequestSnapshot;
use crate::vcs::Vcs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Verdict plus the merge attempt, when one was made
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Eligibility decision
    pub verdict: Verdict,
    /// Merge attempt, only for eligible verdicts
    pub merge: Option<MergeAttempt>,
}

/// Validation and merge gating for one PR
pub struct MergeGate<'a> {
    platform: &'a dyn PlatformService,
    vcs: &'a dyn Vcs,
    commands: &'a dyn CommandRunner,
    config_source: &'a dyn ConfigSource,
    settings: &'a Settings,
    pr_number: u64,
    build_dir: Option<PathBuf>,
}

impl<'a> MergeGate<'a> {
    /// Create a gate for `pr_number` in the platform's repository
    pub const fn new(
        platform: &'a dyn PlatformService,
        vcs: &'a dyn Vcs,
        commands: &'a dyn CommandRunner,
        config_source: &'a dyn ConfigSource,
        settings: &'a Settings,
        pr_number: u64,
    ) -> Self {
        Self {
            platform,
            vcs,
            commands,
            config_source,
            settings,
            pr_number,
            build_dir: None,
        }
    }

    /// Use `dir` as the workspace instead of one under the build root
    #[must_use]
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    /// PR number this gate handles
    pub const fn pr_number(&self) -> u64 {
        self.pr_number
    }

    /// Workspace directory for this PR
    pub fn build_dir(&self) -> PathBuf {
        self.build_dir.clone().unwrap_or_else(|| {
            self.settings
                .build_dir(&self.platform.config().repo, self.pr_number)
        })
    }

    /// Fetch the current PR state
    pub async fn snapshot(&self) -> Result<PullRequestSnapshot> {
        self.platform.get_pull_request(self.pr_number).await
    }

    /// Review policy for a run's config
    pub fn policy(&self, run: &ValidationRun) -> ReviewPolicy {
        ReviewPolicy::from_config(run.config.as_ref(), &self.settings.bot_login)
    }

    /// Clone, merge the PR head onto its base, and run the build steps
    pub async fn validate(&self, progress: &dyn ProgressCallback) -> Result<ValidationRun> {
        let snapshot = self.snapshot().await?;
        let remote_url = self.settings.remote_url(&self.platform.config().repo)?;
        let build_dir = self.build_dir();
        info!(
            pr_number = self.pr_number,
            head = %snapshot.head_sha,
            base = %snapshot.base_ref,
            dir = %build_dir.display(),
            "validating"
        );

        IntegrationRunner::new(self.vcs, self.commands, self.config_source, build_dir)
            .with_step_timeout(self.settings.step_timeout())
            .with_progress(progress)
            .run(&remote_url, &snapshot.head_sha, &snapshot.base_ref)
            .await
    }

    /// Qualifying reviews under the run's policy
    pub async fn reviews(&self, run: &ValidationRun) -> Result<Vec<ReviewComment>> {
        let snapshot = self.snapshot().await?;
        self.reviews_for(run, &snapshot).await
    }

    async fn reviews_for(
        &self,
        run: &ValidationRun,
        snapshot: &PullRequestSnapshot,
    ) -> Result<Vec<ReviewComment>> {
        qualifying_reviews(
            self.platform,
            self.pr_number,
            &snapshot.author_login,
            &self.policy(run),
        )
        .await
    }

    /// Verdict for a run, without posting anything
    pub async fn assess(&self, run: &ValidationRun) -> Result<Verdict> {
        let snapshot = self.snapshot().await?;
        let reviews = self.reviews_for(run, &snapshot).await?;

        let verdict = evaluate_eligibility(&EligibilityInput {
            snapshot: &snapshot,
            ledger: &run.ledger,
            config: run.config.as_ref(),
            review_count: reviews.len(),
        });
        debug!(
            pr_number = self.pr_number,
            eligible = verdict.eligible,
            reasons = ?verdict.reasons,
            "evaluated"
        );
        Ok(verdict)
    }

    /// Verdict for a run; posts the verdict's notification, if any
    pub async fn evaluate(&self, run: &ValidationRun) -> Result<Verdict> {
        let verdict = self.assess(run).await?;
        if let Some(notification) = verdict.notification() {
            self.platform
                .create_pr_comment(self.pr_number, &notification)
                .await?;
        }
        Ok(verdict)
    }

    /// Evaluate, and merge when eligible
    pub async fn evaluate_and_maybe_merge(
        &self,
        run: &ValidationRun,
        progress: &dyn ProgressCallback,
    ) -> Result<GateOutcome> {
        let verdict = self.evaluate(run).await?;
        if !verdict.eligible {
            return Ok(GateOutcome {
                verdict,
                merge: None,
            });
        }
        let merge = self.merge(run, progress).await?;
        Ok(GateOutcome {
            verdict,
            merge: Some(merge),
        })
    }

    /// Re-validate and merge, regardless of any earlier verdict
    pub async fn merge(
        &self,
        run: &ValidationRun,
        progress: &dyn ProgressCallback,
    ) -> Result<MergeAttempt> {
        let policy = self.policy(run);
        let request = MergeRequest {
            config: run.config.as_ref(),
            policy: &policy,
            commit_message: &self.settings.merge_commit_message,
        };
        execute_merge(self.platform, self.pr_number, &request, progress).await
    }

    /// Post the build status comment for a run
    pub async fn post_build_status(&self, run: &ValidationRun) -> Result<()> {
        let policy = self.policy(run);
        let reviews = self.reviews(run).await?;
        let summary = ReviewSummary {
            count: reviews.len(),
            minimum: run
                .config
                .as_ref()
                .map_or(DEFAULT_MINIMUM_REVIEWERS, |c| c.effective_minimum_reviewers()),
            org: policy
                .org_mode
                .then(|| self.platform.config().repo.org().to_string()),
        };

        let pastes = upload_step_outputs(self.platform, &run.ledger).await?;
        let body = render_build_status_comment(&run.ledger, &pastes, &summary);
        self.platform.create_pr_comment(self.pr_number, &body).await
    }

    /// Post the list of reviewers whose reviews counted
    pub async fn post_reviewers(&self, run: &ValidationRun) -> Result<()> {
        let reviews = self.reviews(run).await?;
        let body = render_reviewers_comment(&reviews);
        self.platform.create_pr_comment(self.pr_number, &body).await
    }

    /// Close the PR without merging
    pub async fn close(&self) -> Result<()> {
        info!(pr_number = self.pr_number, "closing PR");
        self.platform.close_pr(self.pr_number).await
    }
}
