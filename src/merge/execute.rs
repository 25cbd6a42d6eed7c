//! Merge execution - effectful operations
//!
//! The eligibility verdict may be stale by the time a merge is requested, so
//! the executor re-checks every precondition it can see from the provider
//! before calling the merge API. It does not look at the ledger; the caller
//! decides whether validation passed.

use crate::config::ThumbsConfig;
use crate::error::Result;
use crate::integration::ProgressCallback;
use crate::ledger::StepResult;
use crate::platform::PlatformService;
use crate::review::{ReviewPolicy, qualifying_reviews};
use crate::types::{MergeResult, MergeableState, PrState, PullRequestSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Outcome of a merge attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAttempt {
    /// `ok` only when the provider merged the PR
    pub result: StepResult,
    /// Why the attempt stopped, or the success line
    pub message: String,
    /// Provider response or error text
    pub output: Option<String>,
    /// When the attempt started
    pub started_at: DateTime<Utc>,
    /// When the attempt finished
    pub ended_at: DateTime<Utc>,
}

impl MergeAttempt {
    fn refused(started_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            result: StepResult::Error,
            message: message.into(),
            output: None,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Whether the provider merged the PR
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.result == StepResult::Ok
    }
}

/// Inputs the executor needs besides the provider
#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    /// Repository config from the validation run
    pub config: Option<&'a ThumbsConfig>,
    /// Review counting policy
    pub policy: &'a ReviewPolicy,
    /// Merge commit message
    pub commit_message: &'a str,
}

/// Re-validate and merge a PR (EFFECTFUL)
///
/// Refusals come back as an `error` attempt with a short reason and nothing
/// posted. A provider failure on the merge call itself is also an `error`
/// attempt, carrying the provider's text. Only failures while re-checking
/// are `Err`.
pub async fn execute_merge(
    platform: &dyn PlatformService,
    pr_number: u64,
    request: &MergeRequest<'_>,
    progress: &dyn ProgressCallback,
) -> Result<MergeAttempt> {
    let started_at = Utc::now();
    debug!(pr_number, "starting merge");

    if platform.is_merged(pr_number).await? {
        debug!(pr_number, "already merged");
        return Ok(MergeAttempt::refused(started_at, "already merged"));
    }

    let snapshot = platform.get_pull_request(pr_number).await?;
    if let Some(reason) = recheck(&snapshot, request.config) {
        debug!(pr_number, reason, "merge refused");
        return Ok(MergeAttempt::refused(started_at, reason));
    }

    // recheck guarantees config and minimum_reviewers are present
    let need = request
        .config
        .and_then(|c| c.minimum_reviewers)
        .unwrap_or_default();
    let reviews =
        qualifying_reviews(platform, pr_number, &snapshot.author_login, request.policy).await?;
    if (reviews.len() as u64) < need {
        debug!(pr_number, have = reviews.len(), need, "insufficient reviews");
        return Ok(MergeAttempt::refused(started_at, "insufficient reviews"));
    }

    if !request.config.is_some_and(ThumbsConfig::merge_enabled) {
        debug!(pr_number, "merge disabled by config");
        return Ok(MergeAttempt::refused(
            started_at,
            ".thumbs.yml config merge=false",
        ));
    }

    progress
        .on_message(&format!("Merging PR #{pr_number}: {}", snapshot.title))
        .await;

    let outcome = match platform.merge_pr(pr_number, request.commit_message).await {
        Ok(result) if result.merged => result,
        Ok(result) => {
            let text = result.message.unwrap_or_default();
            warn!(pr_number, %text, "merge not performed");
            return Ok(MergeAttempt {
                result: StepResult::Error,
                message: format!("Merge FAILED {text}"),
                output: Some(text),
                started_at,
                ended_at: Utc::now(),
            });
        }
        Err(e) => {
            warn!(pr_number, error = %e, "merge failed");
            return Ok(MergeAttempt {
                result: StepResult::Error,
                message: format!("Merge FAILED {e}"),
                output: Some(e.to_string()),
                started_at,
                ended_at: Utc::now(),
            });
        }
    };

    let rendered = render_merge_response(&outcome);
    let comment = merge_success_comment(platform, &snapshot, &rendered);

    // Merged already; a failed comment should not turn this into a failure
    if let Err(e) = platform.create_pr_comment(pr_number, &comment).await {
        warn!(pr_number, error = %e, "failed to post merge comment");
        progress
            .on_message(&format!("Merged, but failed to post comment: {e}"))
            .await;
    }

    info!(pr_number, sha = ?outcome.sha, "[ MERGE ] merged");
    Ok(MergeAttempt {
        result: StepResult::Ok,
        message: format!("Merged PR #{pr_number}"),
        output: Some(rendered),
        started_at,
        ended_at: Utc::now(),
    })
}

/// Provider-visible preconditions, in order. Returns the refusal message.
fn recheck(snapshot: &PullRequestSnapshot, config: Option<&ThumbsConfig>) -> Option<&'static str> {
    if snapshot.state != PrState::Open {
        return Some("pr not open");
    }
    if snapshot.mergeable != Some(true) {
        return Some(".mergeable returns false");
    }
    if snapshot.mergeable_state != MergeableState::Clean {
        return Some(".mergeable_state not clean");
    }
    match config {
        Some(c) if c.build_steps.is_some() && c.minimum_reviewers.is_some() => None,
        _ => Some("no usable .thumbs.yml"),
    }
}

fn render_merge_response(result: &MergeResult) -> String {
    serde_norway::to_string(result).unwrap_or_else(|e| format!("{result:?} ({e})"))
}

fn merge_success_comment(
    platform: &dyn PlatformService,
    snapshot: &PullRequestSnapshot,
    rendered: &str,
) -> String {
    format!(
        "Successfully merged *{}/pulls/{}* (*{}* on to *{}*)\n\n```yaml\n{}\n```\n",
        platform.config().repo,
        snapshot.number,
        snapshot.head_sha,
        snapshot.base_ref,
        rendered.trim_end()
    )
}
