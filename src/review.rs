//! Review classification
//!
//! A review is a `+1` comment from someone other than the PR author. In org
//! mode the reviewer must also belong to the repository's organization, and
//! the bot account never counts.
//!
//! Two phases, like the merge module: [`gather_org_members`] does the
//! provider lookups, [`classify_reviews`] is pure.

use crate::config::ThumbsConfig;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::PrComment;
use std::collections::HashSet;
use tracing::debug;

/// Approval token. Matched as a plain substring, so `+10` counts too.
pub const APPROVAL_TOKEN: &str = "+1";

/// Review counting policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPolicy {
    /// Restrict to organization members
    pub org_mode: bool,
    /// Count each login at most once
    pub dedupe_by_login: bool,
    /// Logins that never count in org mode
    pub excluded_logins: Vec<String>,
}

impl ReviewPolicy {
    /// Build the policy from repository config plus the bot login
    pub fn from_config(config: Option<&ThumbsConfig>, bot_login: &str) -> Self {
        Self {
            org_mode: config.is_some_and(|c| c.org_mode),
            dedupe_by_login: config.is_some_and(|c| c.dedupe_reviewers_by_login),
            excluded_logins: vec![bot_login.to_string()],
        }
    }

    fn is_excluded(&self, login: &str) -> bool {
        self.excluded_logins.iter().any(|l| l == login)
    }
}

/// A comment considered for review counting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    /// Comment author
    pub author_login: String,
    /// Comment body
    pub body: String,
    /// Whether the PR author wrote it
    pub by_pr_author: bool,
}

impl ReviewComment {
    /// Derive from a raw comment and the PR author's login
    pub fn from_comment(comment: &PrComment, pr_author: &str) -> Self {
        Self {
            author_login: comment.author_login.clone(),
            body: comment.body.clone(),
            by_pr_author: comment.author_login == pr_author,
        }
    }
}

/// Whether a comment body carries an approval
#[must_use]
pub fn contains_plus_one(body: &str) -> bool {
    body.contains(APPROVAL_TOKEN)
}

/// Look up org membership for every login that could count in org mode.
///
/// Returns an empty set outside org mode; nothing needs looking up there.
pub async fn gather_org_members(
    platform: &dyn PlatformService,
    org: &str,
    comments: &[PrComment],
    pr_author: &str,
    policy: &ReviewPolicy,
) -> Result<HashSet<String>> {
    let mut members = HashSet::new();
    if !policy.org_mode {
        return Ok(members);
    }

    let mut checked = HashSet::new();
    for comment in comments {
        let login = comment.author_login.as_str();
        if login == pr_author || policy.is_excluded(login) || !checked.insert(login) {
            continue;
        }
        if platform.is_org_member(org, login).await? {
            members.insert(login.to_string());
        }
    }

    debug!(org, candidates = checked.len(), members = members.len(), "gathered org members");
    Ok(members)
}

/// Select qualifying reviews (PURE)
///
/// `org_members` is only consulted in org mode.
#[must_use]
pub fn classify_reviews(
    comments: &[PrComment],
    pr_author: &str,
    policy: &ReviewPolicy,
    org_members: &HashSet<String>,
) -> Vec<ReviewComment> {
    let mut seen = HashSet::new();

    comments
        .iter()
        .map(|c| ReviewComment::from_comment(c, pr_author))
        .filter(|c| !c.by_pr_author)
        .filter(|c| {
            !policy.org_mode
                || (org_members.contains(&c.author_login) && !policy.is_excluded(&c.author_login))
        })
        .filter(|c| contains_plus_one(&c.body))
        .filter(|c| !policy.dedupe_by_login || seen.insert(c.author_login.clone()))
        .collect()
}

/// Fetch comments and return the qualifying reviews for a PR
pub async fn qualifying_reviews(
    platform: &dyn PlatformService,
    pr_number: u64,
    pr_author: &str,
    policy: &ReviewPolicy,
) -> Result<Vec<ReviewComment>> {
    let comments = platform.list_pr_comments(pr_number).await?;
    let org = platform.config().repo.org().to_string();
    let members = gather_org_members(platform, &org, &comments, pr_author, policy).await?;
    let reviews = classify_reviews(&comments, pr_author, policy, &members);

    debug!(
        pr_number,
        org_mode = policy.org_mode,
        reviewers = ?reviews.iter().map(|r| r.author_login.as_str()).collect::<Vec<_>>(),
        "calculated reviews"
    );
    Ok(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(author: &str, body: &str) -> PrComment {
        PrComment {
            id: 0,
            author_login: author.to_string(),
            body: body.to_string(),
        }
    }

    fn members(logins: &[&str]) -> HashSet<String> {
        logins.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_plus_one_substring_match() {
        assert!(contains_plus_one("+1"));
        assert!(contains_plus_one("+100"));
        assert!(contains_plus_one("lgtm +1 nice"));
        assert!(!contains_plus_one("+ 1"));
        assert!(!contains_plus_one("looks good"));
    }

    #[test]
    fn test_author_comments_never_count() {
        let comments = vec![comment("alice", "+1"), comment("bob", "+1")];
        let policy = ReviewPolicy::default();

        let reviews = classify_reviews(&comments, "alice", &policy, &HashSet::new());
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author_login, "bob");

        let org_policy = ReviewPolicy {
            org_mode: true,
            ..ReviewPolicy::default()
        };
        let reviews = classify_reviews(&comments, "alice", &org_policy, &members(&["alice"]));
        assert!(reviews.is_empty());
    }

    #[test]
    fn test_non_org_mode_counts_any_non_author() {
        let comments = vec![
            comment("bob", "+1"),
            comment("carol", "+100"),
            comment("dave", "lgtm +1 nice"),
            comment("erin", "+ 1"),
        ];
        let reviews = classify_reviews(&comments, "alice", &ReviewPolicy::default(), &HashSet::new());
        let logins: Vec<_> = reviews.iter().map(|r| r.author_login.as_str()).collect();
        assert_eq!(logins, vec!["bob", "carol", "dave"]);
    }

    #[test]
    fn test_org_mode_requires_membership_and_excludes_bot() {
        let comments = vec![
            comment("bob", "+1"),
            comment("mallory", "+1"),
            comment("thumbot", "+1"),
        ];
        let policy = ReviewPolicy::from_config(
            Some(&ThumbsConfig {
                org_mode: true,
                ..ThumbsConfig::default()
            }),
            "thumbot",
        );

        let reviews = classify_reviews(&comments, "alice", &policy, &members(&["bob", "thumbot"]));
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author_login, "bob");
    }

    #[test]
    fn test_duplicates_count_twice_by_default() {
        let comments = vec![comment("bob", "+1"), comment("bob", "+1 again")];
        let reviews = classify_reviews(&comments, "alice", &ReviewPolicy::default(), &HashSet::new());
        assert_eq!(reviews.len(), 2);
    }

    #[test]
    fn test_dedupe_toggle_counts_login_once() {
        let comments = vec![
            comment("bob", "+1"),
            comment("bob", "+1 again"),
            comment("carol", "+1"),
        ];
        let policy = ReviewPolicy {
            dedupe_by_login: true,
            ..ReviewPolicy::default()
        };
        let reviews = classify_reviews(&comments, "alice", &policy, &HashSet::new());
        assert_eq!(reviews.len(), 2);
    }

    #[test]
    fn test_policy_from_missing_config_is_unrestricted() {
        let policy = ReviewPolicy::from_config(None, "thumbot");
        assert!(!policy.org_mode);
        assert!(!policy.dedupe_by_login);
        assert_eq!(policy.excluded_logins, vec!["thumbot".to_string()]);
    }
}
