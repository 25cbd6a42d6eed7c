//! Driver settings
//!
//! Everything the engine needs that is not repository policy: where to build,
//! which account is the bot, how long a step may run. Loaded once at startup
//! and passed explicitly into the gate and its collaborators.

use crate::error::{Error, Result};
use crate::types::RepoId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Settings filename under the user config directory
const SETTINGS_FILE: &str = "settings.toml";

/// Default bot login; excluded from org-mode review counts
pub const DEFAULT_BOT_LOGIN: &str = "thumbot";

/// Default merge commit message
pub const DEFAULT_MERGE_MESSAGE: &str = "Thumbs Git Robot Merge. ";

/// Default per-step time budget
const DEFAULT_STEP_TIMEOUT_SECS: u64 = 3600;

/// How the repository is cloned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneProtocol {
    /// `git@host:owner/name`
    #[default]
    Ssh,
    /// `https://host/owner/name.git`
    Https,
}

/// Driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory under which per-PR workspaces are created
    pub build_root: PathBuf,
    /// Bot account login
    pub bot_login: String,
    /// Commit message used for automatic merges
    pub merge_commit_message: String,
    /// Per-step time budget in seconds; 0 disables the limit
    pub step_timeout_secs: u64,
    /// Git host to clone from
    pub git_host: String,
    /// Clone protocol
    pub clone_protocol: CloneProtocol,
    /// GitHub Enterprise host for API calls (None for github.com)
    pub api_host: Option<String>,
    /// Committer identity for merge simulation (`name`, `email`)
    pub committer: Option<(String, String)>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            build_root: std::env::temp_dir().join("thumbs"),
            bot_login: DEFAULT_BOT_LOGIN.to_string(),
            merge_commit_message: DEFAULT_MERGE_MESSAGE.to_string(),
            step_timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
            git_host: "github.com".to_string(),
            clone_protocol: CloneProtocol::default(),
            api_host: None,
            committer: None,
        }
    }
}

impl Settings {
    /// Default settings path (`<config dir>/thumbs/settings.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("thumbs").join(SETTINGS_FILE))
    }

    /// Load settings from a TOML file.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Workspace directory for one pull request
    pub fn build_dir(&self, repo: &RepoId, pr_number: u64) -> PathBuf {
        self.build_root.join(format!("{}_{pr_number}", repo.slug()))
    }

    /// Step time budget, `None` when disabled
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_secs > 0).then(|| Duration::from_secs(self.step_timeout_secs))
    }

    /// Remote URL to clone the repository from
    pub fn remote_url(&self, repo: &RepoId) -> Result<String> {
        match self.clone_protocol {
            CloneProtocol::Ssh => Ok(format!("git@{}:{repo}", self.git_host)),
            CloneProtocol::Https => {
                let base = Url::parse(&format!("https://{}/", self.git_host))
                    .map_err(|e| Error::Config(format!("invalid git host {}: {e}", self.git_host)))?;
                let url = base
                    .join(&format!("{repo}.git"))
                    .map_err(|e| Error::Config(format!("invalid repository path {repo}: {e}")))?;
                Ok(url.to_string())
            }
        }
    }
}
