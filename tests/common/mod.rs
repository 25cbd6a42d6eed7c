//! Shared test utilities

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::MockPlatformService;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use thumbs::command::{CommandOutput, CommandRunner};
use thumbs::config::{ConfigSource, ThumbsConfig, parse_config};
use thumbs::error::{Error, Result};
use thumbs::types::{
    MergeableState, PlatformConfig, PrComment, PrState, PullRequestSnapshot, RepoId,
};
use thumbs::vcs::{Checkout, Vcs};

/// Platform config for `acme/widgets` on github.com
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        repo: RepoId::new("acme", "widgets"),
        host: None,
    }
}

/// Open, mergeable, clean PR authored by `alice`
pub fn make_snapshot(number: u64) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number,
        title: format!("PR {number}"),
        state: PrState::Open,
        head_sha: "abc123".to_string(),
        head_ref: "feature".to_string(),
        base_ref: "main".to_string(),
        author_login: "alice".to_string(),
        mergeable: Some(true),
        mergeable_state: MergeableState::Clean,
        html_url: format!("https://github.com/acme/widgets/pull/{number}"),
    }
}

/// Comment by `author`
pub fn make_comment(id: u64, author: &str, body: &str) -> PrComment {
    PrComment {
        id,
        author_login: author.to_string(),
        body: body.to_string(),
    }
}

/// Parse a `.thumbs.yml` body
pub fn make_config(yaml: &str) -> ThumbsConfig {
    parse_config(yaml).unwrap()
}

// =============================================================================
// Fake VCS
// =============================================================================

/// Records git operations; clone or merge can be made to fail
#[derive(Default)]
pub struct FakeVcs {
    pub fail_clone: Option<String>,
    pub fail_merge: Option<String>,
    pub ops: std::sync::Arc<Mutex<Vec<String>>>,
}

impl FakeVcs {
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn clone_repo(&self, remote_url: &str, dir: &Path) -> Result<Box<dyn Checkout>> {
        self.ops.lock().unwrap().push(format!("clone {remote_url}"));
        if let Some(msg) = &self.fail_clone {
            return Err(Error::Git(msg.clone()));
        }
        std::fs::create_dir_all(dir)?;
        Ok(Box::new(FakeCheckout {
            dir: dir.to_path_buf(),
            fail_merge: self.fail_merge.clone(),
            ops: self.ops.clone(),
        }))
    }
}

struct FakeCheckout {
    dir: PathBuf,
    fail_merge: Option<String>,
    ops: std::sync::Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Checkout for FakeCheckout {
    fn dir(&self) -> &Path {
        &self.dir
    }

    async fn checkout(&self, rev: &str) -> Result<()> {
        self.ops.lock().unwrap().push(format!("checkout {rev}"));
        Ok(())
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        let prefix = name.split('_').next().unwrap_or(name);
        self.ops.lock().unwrap().push(format!("branch {prefix}"));
        Ok(())
    }

    async fn merge(&self, rev: &str) -> Result<String> {
        self.ops.lock().unwrap().push(format!("merge {rev}"));
        match &self.fail_merge {
            Some(msg) => Err(Error::Git(msg.clone())),
            None => Ok(format!("Merged {rev}")),
        }
    }
}

// =============================================================================
// Fake command runner
// =============================================================================

/// Records commands in order; exit codes and timeouts are scripted per command
#[derive(Default)]
pub struct FakeCommandRunner {
    pub exit_codes: HashMap<String, i32>,
    pub timeouts: HashSet<String>,
    pub calls: Mutex<Vec<(String, PathBuf, Option<Duration>)>>,
}

impl FakeCommandRunner {
    pub fn failing(command: &str, code: i32) -> Self {
        let mut runner = Self::default();
        runner.exit_codes.insert(command.to_string(), code);
        runner
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _, _)| c.clone())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), cwd.to_path_buf(), timeout));
        if self.timeouts.contains(command) {
            return Err(Error::Timeout {
                secs: timeout.map_or(0, |t| t.as_secs()),
            });
        }
        let code = self.exit_codes.get(command).copied().unwrap_or(0);
        Ok(CommandOutput {
            exit_code: Some(code),
            output: format!("ran {command}\n"),
        })
    }
}

// =============================================================================
// Fake config source
// =============================================================================

/// Returns a fixed config regardless of directory
#[derive(Default)]
pub struct FakeConfigSource {
    pub config: Option<ThumbsConfig>,
    pub loads: Mutex<Vec<PathBuf>>,
}

impl FakeConfigSource {
    pub fn new(yaml: &str) -> Self {
        Self {
            config: Some(make_config(yaml)),
            loads: Mutex::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }
}

impl ConfigSource for FakeConfigSource {
    fn load(&self, dir: &Path) -> Option<ThumbsConfig> {
        self.loads.lock().unwrap().push(dir.to_path_buf());
        self.config.clone()
    }
}
