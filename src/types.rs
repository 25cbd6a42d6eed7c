//! Core types for thumbs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repository identifier from its parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Organization used for org-mode review counting (first path segment)
    pub fn org(&self) -> &str {
        &self.owner
    }

    /// Filesystem-safe form, `owner_name`
    pub fn slug(&self) -> String {
        format!("{}_{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().trim_end_matches('/').split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name.trim_end_matches(".git")))
            }
            _ => Err(Error::InvalidRepo(s.to_string())),
        }
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Repository the service is bound to
    pub repo: RepoId,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// Provider's merge-state classification
///
/// Only `Clean` permits an automatic merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeableState {
    /// No conflicts, checks passing
    Clean,
    /// Merge conflicts
    Dirty,
    /// Blocked by branch protection
    Blocked,
    /// Head is behind the base branch
    Behind,
    /// Mergeable but with failing non-required checks
    Unstable,
    /// Mergeable with passing commit status and pre-receive hooks
    HasHooks,
    /// PR is a draft
    Draft,
    /// Not computed yet, or a value we do not recognise
    Unknown,
}

impl std::fmt::Display for MergeableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Clean => "clean",
            Self::Dirty => "dirty",
            Self::Blocked => "blocked",
            Self::Behind => "behind",
            Self::Unstable => "unstable",
            Self::HasHooks => "has_hooks",
            Self::Draft => "draft",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Point-in-time view of a pull request
///
/// Fetched once per evaluation and passed around by reference so that every
/// precondition in one verdict reads the same provider state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestSnapshot {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// Current state
    pub state: PrState,
    /// Head commit SHA
    pub head_sha: String,
    /// Head branch name
    pub head_ref: String,
    /// Base branch name
    pub base_ref: String,
    /// Login of the PR author
    pub author_login: String,
    /// Whether the provider reports the PR as mergeable
    /// - `Some(true)` = mergeable
    /// - `Some(false)` = has conflicts
    /// - `None` = unknown (still computing)
    pub mergeable: Option<bool>,
    /// Provider's merge-state classification
    pub mergeable_state: MergeableState,
    /// Web URL for the PR
    pub html_url: String,
}

/// A comment on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrComment {
    /// Comment ID
    pub id: u64,
    /// Login of the comment author
    pub author_login: String,
    /// Comment body text
    pub body: String,
}

/// Result of a merge call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation
    pub message: Option<String>,
}
