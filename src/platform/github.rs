//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    MergeResult, MergeableState, PlatformConfig, PrComment, PrState, PullRequestSnapshot, RepoId,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::debug;

/// Comments fetched per page when listing
const COMMENTS_PER_PAGE: u8 = 100;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
}

impl GitHubService {
    /// Create a new GitHub service bound to `repo`
    pub fn new(token: &str, repo: RepoId, host: Option<String>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(ref h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            config: PlatformConfig { repo, host },
        })
    }

    fn owner(&self) -> &str {
        &self.config.repo.owner
    }

    fn repo(&self) -> &str {
        &self.config.repo.name
    }
}

/// Map octocrab's merge-state classification onto ours
fn mergeable_state_from_octocrab(
    state: Option<&octocrab::models::pulls::MergeableState>,
) -> MergeableState {
    use octocrab::models::pulls::MergeableState as Gh;

    match state {
        Some(Gh::Clean) => MergeableState::Clean,
        Some(Gh::Dirty) => MergeableState::Dirty,
        Some(Gh::Blocked) => MergeableState::Blocked,
        Some(Gh::Behind) => MergeableState::Behind,
        Some(Gh::Unstable) => MergeableState::Unstable,
        Some(Gh::HasHooks) => MergeableState::HasHooks,
        Some(Gh::Draft) => MergeableState::Draft,
        // MergeableState is non-exhaustive
        Some(_) | None => MergeableState::Unknown,
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequestSnapshot> {
        debug!(pr_number, "getting PR");

        let pr = self
            .client
            .pulls(self.owner(), self.repo())
            .get(pr_number)
            .await?;

        let state = match pr.state {
            Some(octocrab::models::IssueState::Open) => PrState::Open,
            Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => PrState::Merged,
            // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
            Some(_) | None => PrState::Closed,
        };

        let snapshot = PullRequestSnapshot {
            number: pr.number,
            title: pr.title.clone().unwrap_or_default(),
            state,
            head_sha: pr.head.sha.clone(),
            head_ref: pr.head.ref_field.clone(),
            base_ref: pr.base.ref_field.clone(),
            author_login: pr
                .user
                .as_ref()
                .map(|u| u.login.clone())
                .unwrap_or_default(),
            mergeable: pr.mergeable,
            mergeable_state: mergeable_state_from_octocrab(pr.mergeable_state.as_ref()),
            html_url: pr
                .html_url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        };

        debug!(
            pr_number,
            state = %snapshot.state,
            mergeable = ?snapshot.mergeable,
            mergeable_state = %snapshot.mergeable_state,
            "got PR"
        );
        Ok(snapshot)
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        debug!(pr_number, "listing PR comments");
        let first_page = self
            .client
            .issues(self.owner(), self.repo())
            .list_comments(pr_number)
            .per_page(COMMENTS_PER_PAGE)
            .send()
            .await?;

        let comments = self.client.all_pages(first_page).await?;

        let result: Vec<PrComment> = comments
            .into_iter()
            .map(|c| PrComment {
                id: c.id.0,
                author_login: c.user.login,
                body: c.body.unwrap_or_default(),
            })
            .collect();
        debug!(pr_number, count = result.len(), "listed PR comments");
        Ok(result)
    }

    async fn is_org_member(&self, org: &str, login: &str) -> Result<bool> {
        debug!(org, login, "checking org membership");
        let member = self.client.orgs(org).check_membership(login).await?;
        debug!(org, login, member, "checked org membership");
        Ok(member)
    }

    async fn merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeResult> {
        debug!(pr_number, "merging PR");

        let result = self
            .client
            .pulls(self.owner(), self.repo())
            .merge(pr_number)
            .message(commit_message)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn is_merged(&self, pr_number: u64) -> Result<bool> {
        debug!(pr_number, "checking merged");
        let merged = self
            .client
            .pulls(self.owner(), self.repo())
            .is_merged(pr_number)
            .await?;
        Ok(merged)
    }

    async fn close_pr(&self, pr_number: u64) -> Result<()> {
        debug!(pr_number, "closing PR");
        self.client
            .issues(self.owner(), self.repo())
            .update(pr_number)
            .state(octocrab::models::IssueState::Closed)
            .send()
            .await?;
        debug!(pr_number, "closed PR");
        Ok(())
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        debug!(pr_number, "creating PR comment");
        self.client
            .issues(self.owner(), self.repo())
            .create_comment(pr_number, body)
            .await?;
        debug!(pr_number, "created PR comment");
        Ok(())
    }

    async fn create_paste(&self, filename: &str, content: &str) -> Result<String> {
        debug!(filename, bytes = content.len(), "creating gist");
        let gist = self
            .client
            .gists()
            .create()
            .file(filename, content)
            .public(false)
            .send()
            .await?;
        let url = gist.html_url.to_string();
        debug!(filename, %url, "created gist");
        Ok(url)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
