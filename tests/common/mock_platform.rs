//! Mock platform service for testing

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use thumbs::error::{Error, Result};
use thumbs::platform::PlatformService;
use thumbs::types::{MergeResult, PlatformConfig, PrComment, PullRequestSnapshot};

/// Call record for `create_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub commit_message: String,
}

/// Call record for `create_paste`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePasteCall {
    pub filename: String,
    pub content: String,
}

/// Simple mock platform service for testing
///
/// Hand-written rather than generated so call records and canned responses
/// stay readable in assertions.
///
/// Features:
/// - Configurable PR snapshots, comments, org members
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    pr_responses: Mutex<HashMap<u64, PullRequestSnapshot>>,
    comments: Mutex<HashMap<u64, Vec<PrComment>>>,
    org_members: Mutex<HashSet<String>>,
    merged: Mutex<HashSet<u64>>,
    merge_responses: Mutex<HashMap<u64, MergeResult>>,
    // Call tracking
    get_pr_calls: Mutex<Vec<u64>>,
    org_member_calls: Mutex<Vec<(String, String)>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    is_merged_calls: Mutex<Vec<u64>>,
    close_calls: Mutex<Vec<u64>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    create_paste_calls: Mutex<Vec<CreatePasteCall>>,
    // Error injection
    error_on_get_pr: Mutex<Option<String>>,
    error_on_list_comments: Mutex<Option<String>>,
    error_on_org_member: Mutex<Option<String>>,
    error_on_merge_pr: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            pr_responses: Mutex::new(HashMap::new()),
            comments: Mutex::new(HashMap::new()),
            org_members: Mutex::new(HashSet::new()),
            merged: Mutex::new(HashSet::new()),
            merge_responses: Mutex::new(HashMap::new()),
            get_pr_calls: Mutex::new(Vec::new()),
            org_member_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            is_merged_calls: Mutex::new(Vec::new()),
            close_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            create_paste_calls: Mutex::new(Vec::new()),
            error_on_get_pr: Mutex::new(None),
            error_on_list_comments: Mutex::new(None),
            error_on_org_member: Mutex::new(None),
            error_on_merge_pr: Mutex::new(None),
        }
    }

    // === Error injection methods ===

    /// Make `get_pull_request` return an error
    pub fn fail_get_pr(&self, msg: &str) {
        *self.error_on_get_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_pr_comments` return an error
    pub fn fail_list_comments(&self, msg: &str) {
        *self.error_on_list_comments.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `is_org_member` return an error
    pub fn fail_org_member(&self, msg: &str) {
        *self.error_on_org_member.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge_pr` return an error
    pub fn fail_merge_pr(&self, msg: &str) {
        *self.error_on_merge_pr.lock().unwrap() = Some(msg.to_string());
    }

    // === Response setup ===

    /// Set the snapshot returned for a PR
    pub fn set_pr_response(&self, pr: PullRequestSnapshot) {
        self.pr_responses.lock().unwrap().insert(pr.number, pr);
    }

    /// Set the comments on a PR, in order
    pub fn set_comments(&self, pr_number: u64, comments: Vec<PrComment>) {
        self.comments.lock().unwrap().insert(pr_number, comments);
    }

    /// Set the organization's members
    pub fn set_org_members(&self, logins: &[&str]) {
        *self.org_members.lock().unwrap() = logins.iter().map(ToString::to_string).collect();
    }

    /// Mark a PR as already merged
    pub fn set_merged(&self, pr_number: u64) {
        self.merged.lock().unwrap().insert(pr_number);
    }

    /// Set the response for `merge_pr`
    pub fn set_merge_response(&self, pr_number: u64, result: MergeResult) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(pr_number, result);
    }

    // === Call inspection ===

    /// Get all `get_pull_request` calls
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// Get all `is_org_member` calls as (org, login)
    pub fn get_org_member_calls(&self) -> Vec<(String, String)> {
        self.org_member_calls.lock().unwrap().clone()
    }

    /// Get all `merge_pr` calls
    pub fn get_merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    /// Get all `is_merged` calls
    pub fn get_is_merged_calls(&self) -> Vec<u64> {
        self.is_merged_calls.lock().unwrap().clone()
    }

    /// Get all `close_pr` calls
    pub fn get_close_calls(&self) -> Vec<u64> {
        self.close_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr_comment` calls
    pub fn get_create_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    /// Get all `create_paste` calls
    pub fn get_create_paste_calls(&self) -> Vec<CreatePasteCall> {
        self.create_paste_calls.lock().unwrap().clone()
    }

    /// Assert `merge_pr` was called for a PR
    pub fn assert_merge_called(&self, pr_number: u64) {
        let calls = self.get_merge_pr_calls();
        assert!(
            calls.iter().any(|c| c.pr_number == pr_number),
            "Expected merge_pr({pr_number}), got {calls:?}"
        );
    }

    /// Assert `merge_pr` was never called
    pub fn assert_merge_not_called(&self) {
        let calls = self.get_merge_pr_calls();
        assert!(calls.is_empty(), "Expected no merge_pr calls, got {calls:?}");
    }

    /// Assert no comments were posted
    pub fn assert_no_comments(&self) {
        let calls = self.get_create_comment_calls();
        assert!(calls.is_empty(), "Expected no comments, got {calls:?}");
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequestSnapshot> {
        self.get_pr_calls.lock().unwrap().push(pr_number);
        if let Some(msg) = self.error_on_get_pr.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        self.pr_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("PR #{pr_number} not found")))
    }

    async fn list_pr_comments(&self, pr_number: u64) -> Result<Vec<PrComment>> {
        if let Some(msg) = self.error_on_list_comments.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_org_member(&self, org: &str, login: &str) -> Result<bool> {
        self.org_member_calls
            .lock()
            .unwrap()
            .push((org.to_string(), login.to_string()));
        if let Some(msg) = self.error_on_org_member.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(self.org_members.lock().unwrap().contains(login))
    }

    async fn merge_pr(&self, pr_number: u64, commit_message: &str) -> Result<MergeResult> {
        self.merge_pr_calls.lock().unwrap().push(MergePrCall {
            pr_number,
            commit_message: commit_message.to_string(),
        });
        if let Some(msg) = self.error_on_merge_pr.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(format!("Merge failed: {msg}")));
        }
        Ok(self
            .merge_responses
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or(MergeResult {
                merged: true,
                sha: Some("merged-sha".to_string()),
                message: Some("Pull Request successfully merged".to_string()),
            }))
    }

    async fn is_merged(&self, pr_number: u64) -> Result<bool> {
        self.is_merged_calls.lock().unwrap().push(pr_number);
        Ok(self.merged.lock().unwrap().contains(&pr_number))
    }

    async fn close_pr(&self, pr_number: u64) -> Result<()> {
        self.close_calls.lock().unwrap().push(pr_number);
        Ok(())
    }

    async fn create_pr_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        self.create_comment_calls
            .lock()
            .unwrap()
            .push(CreateCommentCall {
                pr_number,
                body: body.to_string(),
            });
        Ok(())
    }

    async fn create_paste(&self, filename: &str, content: &str) -> Result<String> {
        let mut calls = self.create_paste_calls.lock().unwrap();
        calls.push(CreatePasteCall {
            filename: filename.to_string(),
            content: content.to_string(),
        });
        Ok(format!("https://gist.example/{}", calls.len()))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
