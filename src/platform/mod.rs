//! Source-control provider services
//!
//! The engine talks to the provider only through [`PlatformService`], so the
//! eligibility and merge logic can run against a mock in tests.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{MergeResult, PlatformConfig, PrComment, PullRequestSnapshot};
use async_trait::async_trait;

/// Platform service trait for PR operations
///
/// A service is bound to one repository (see [`PlatformConfig`]). Every
/// method is a provider call; failures propagate as hard errors.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Fetch the current state of a PR
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequestSnapshot>;

    /// List all issue comments on a PR
    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>>;

    /// Whether `login` is a member of organization `org`
    async fn is_org_member(&self, org: &str, login: &str) -> Result<bool>;

    /// Merge a PR with the given commit message
    async fn merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeResult>;

    /// Whether the PR has already been merged
    async fn is_merged(&self, pr_number: u64) -> Result<bool>;

    /// Close a PR without merging
    async fn close_pr(&self, pr_number: u64) -> Result<()>;

    /// Create a comment on a PR
    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()>;

    /// Upload text as a private paste and return its URL
    async fn create_paste(&self, filename: &str, content: &str) -> Result<String>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
