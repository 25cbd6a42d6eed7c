//! Integration runner - merge simulation and build steps
//!
//! One runner per validation run. It owns the workspace directory and the
//! ledger, and moves through `Idle → Cloning → Integrating →
//! RunningSteps(i) → Done`. A failed step never stops the run: every
//! configured build step executes, in order, against whatever the workspace
//! looks like at that point.

use crate::command::CommandRunner;
use crate::config::{ConfigSource, ThumbsConfig};
use crate::error::{Error, Result};
use crate::ledger::{BuildStatus, CLONE_STEP, MERGE_STEP, StepResult, StepStatus};
use crate::vcs::{Checkout, Vcs};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Progress callback for step updates
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when a step starts
    async fn on_step_started(&self, name: &str);

    /// Called when a step has been recorded
    async fn on_step_finished(&self, status: &StepStatus);

    /// Called with a free-form status message
    async fn on_message(&self, message: &str);
}

/// Progress callback that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_step_started(&self, _name: &str) {}
    async fn on_step_finished(&self, _status: &StepStatus) {}
    async fn on_message(&self, _message: &str) {}
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Nothing started
    Idle,
    /// Cloning the repository
    Cloning,
    /// Merging the source commit onto the target branch
    Integrating,
    /// Running build step `i` (zero-based)
    RunningSteps(usize),
    /// All steps recorded
    Done,
}

/// Outcome of a validation run
#[derive(Debug, Clone)]
pub struct ValidationRun {
    /// Ordered step outcomes
    pub ledger: BuildStatus,
    /// Repository config as loaded from the integrated workspace
    pub config: Option<ThumbsConfig>,
    /// Workspace the run used
    pub build_dir: PathBuf,
}

/// Derive a stable step key from a command: whitespace runs become `_`,
/// hyphens are dropped.
#[must_use]
pub fn step_name(command: &str) -> String {
    WHITESPACE.replace_all(command, "_").replace('-', "")
}

/// Sequences clone, merge simulation, and build steps into a ledger
pub struct IntegrationRunner<'a> {
    vcs: &'a dyn Vcs,
    commands: &'a dyn CommandRunner,
    config_source: &'a dyn ConfigSource,
    progress: &'a dyn ProgressCallback,
    build_dir: PathBuf,
    step_timeout: Option<Duration>,
    ledger: BuildStatus,
    phase: RunPhase,
}

impl<'a> IntegrationRunner<'a> {
    /// Create a runner that owns `build_dir` for the duration of the run
    pub fn new(
        vcs: &'a dyn Vcs,
        commands: &'a dyn CommandRunner,
        config_source: &'a dyn ConfigSource,
        build_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vcs,
            commands,
            config_source,
            progress: &NoopProgress,
            build_dir: build_dir.into(),
            step_timeout: None,
            ledger: BuildStatus::new(),
            phase: RunPhase::Idle,
        }
    }

    /// Limit how long each build step may run
    #[must_use]
    pub const fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Report step progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Current phase
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Steps recorded so far
    pub const fn ledger(&self) -> &BuildStatus {
        &self.ledger
    }

    /// Workspace directory
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Remove any previous working copy. Not an error if there is none.
    pub fn reset_workspace(&self) -> Result<()> {
        match fs::remove_dir_all(&self.build_dir) {
            Ok(()) => {
                debug!(dir = %self.build_dir.display(), "removed previous workspace");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Workspace(format!(
                "failed to remove {}: {e}",
                self.build_dir.display()
            ))),
        }
    }

    async fn record(&mut self, status: StepStatus) -> StepStatus {
        self.progress.on_step_finished(&status).await;
        self.ledger.record(status.clone());
        status
    }

    /// Clone fresh and merge `source_sha` onto `target_ref` on a transient
    /// branch. Records the `clone` and `merge` steps.
    pub async fn attempt_integration(
        &mut self,
        remote_url: &str,
        source_sha: &str,
        target_ref: &str,
    ) -> StepStatus {
        self.phase = RunPhase::Cloning;
        self.progress.on_step_started(CLONE_STEP).await;
        let clone_status = StepStatus::started(CLONE_STEP);

        let checkout = match self.vcs.clone_repo(remote_url, &self.build_dir).await {
            Ok(checkout) => {
                self.record(
                    clone_status.finish(StepResult::Ok, format!("Cloned {remote_url}")),
                )
                .await;
                checkout
            }
            Err(e) => {
                warn!(remote_url, error = %e, "clone failed");
                self.record(
                    clone_status
                        .finish(StepResult::Error, "Clone failed!")
                        .with_output(e.to_string()),
                )
                .await;
                let merge_status = StepStatus::started(MERGE_STEP)
                    .finish(StepResult::Error, "Merge test failed")
                    .with_output(format!("clone failed: {e}"));
                return self.record(merge_status).await;
            }
        };

        self.phase = RunPhase::Integrating;
        self.progress.on_step_started(MERGE_STEP).await;
        let merge_status = StepStatus::started(MERGE_STEP);
        let branch = format!("feature_{}", Utc::now().timestamp());
        debug!(source_sha, target_ref, %branch, "trying merge");

        let status = match simulate_merge(checkout.as_ref(), source_sha, target_ref, &branch).await
        {
            Ok(summary) => merge_status
                .finish(
                    StepResult::Ok,
                    format!("Merge Success: {source_sha} onto target branch: {target_ref}"),
                )
                .with_output(summary),
            Err(e) => {
                warn!(source_sha, target_ref, error = %e, "merge failed");
                merge_status
                    .finish(StepResult::Error, "Merge test failed")
                    .with_output(e.to_string())
            }
        };
        info!(result = ?status.result, "[ MERGE ]");
        self.record(status).await
    }

    /// Run one build command in the workspace and record it under `name`
    pub async fn run_build_step(&mut self, name: &str, command: &str) -> StepStatus {
        self.progress.on_step_started(name).await;
        let mut status = StepStatus::started(name);
        status.command = Some(command.to_string());

        let status = match self
            .commands
            .run(command, &self.build_dir, self.step_timeout)
            .await
        {
            Ok(output) => {
                let result = StepResult::from_success(output.success());
                let message = match result {
                    StepResult::Ok => "OK".to_string(),
                    StepResult::Error => format!("Step {name} Failed!"),
                };
                let mut status = status.finish(result, message).with_output(output.output);
                status.exit_code = output.exit_code;
                status
            }
            Err(e) => {
                let message = match &e {
                    Error::Timeout { secs } => format!("Step {name} timed out after {secs} seconds"),
                    _ => format!("Step {name} Failed!"),
                };
                status
                    .finish(StepResult::Error, message)
                    .with_output(e.to_string())
            }
        };

        info!(
            step = name,
            result = ?status.result,
            exit_code = ?status.exit_code,
            command,
            "[ {} ]",
            name.to_uppercase()
        );
        self.record(status).await
    }

    /// Full run: reset, integrate, load config, run every build step.
    ///
    /// Only a workspace that cannot be reset is an `Err`; step failures are
    /// recorded in the returned ledger.
    pub async fn run(
        mut self,
        remote_url: &str,
        source_sha: &str,
        target_ref: &str,
    ) -> Result<ValidationRun> {
        self.reset_workspace()?;
        self.attempt_integration(remote_url, source_sha, target_ref)
            .await;

        let config = self.config_source.load(&self.build_dir);
        if config.is_none() {
            self.progress
                .on_message("No usable .thumbs.yml found; skipping build steps")
                .await;
        }

        let build_steps = config
            .as_ref()
            .map(|c| c.build_steps().to_vec())
            .unwrap_or_default();

        for (i, command) in build_steps.iter().enumerate() {
            self.phase = RunPhase::RunningSteps(i);
            self.run_build_step(&step_name(command), command).await;
        }

        self.phase = RunPhase::Done;
        debug!(
            steps = self.ledger.len(),
            problems = ?self.ledger.problem_steps(),
            "validation run done"
        );

        Ok(ValidationRun {
            ledger: self.ledger,
            config,
            build_dir: self.build_dir,
        })
    }
}

/// Check out the source commit, then the target branch, branch off it, and
/// merge the source commit in.
async fn simulate_merge(
    checkout: &dyn Checkout,
    source_sha: &str,
    target_ref: &str,
    branch: &str,
) -> Result<String> {
    checkout.checkout(source_sha).await?;
    checkout.checkout(target_ref).await?;
    checkout.create_branch(branch).await?;
    checkout.merge(source_sha).await
}
