//! `git` CLI backend

use crate::error::{Error, Result};
use crate::vcs::{Checkout, Vcs};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Drives the `git` executable
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    committer: Option<(String, String)>,
}

impl GitCli {
    /// Create a backend using git's own identity configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed committer identity for merge commits
    #[must_use]
    pub fn with_committer(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.committer = Some((name.into(), email.into()));
        self
    }
}

/// A working copy driven through `git -C <dir>`
#[derive(Debug, Clone)]
pub struct GitCheckout {
    dir: PathBuf,
    committer: Option<(String, String)>,
}

impl GitCheckout {
    async fn git(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.dir);
        if let Some((name, email)) = &self.committer {
            cmd.arg("-c")
                .arg(format!("user.name={name}"))
                .arg("-c")
                .arg(format!("user.email={email}"));
        }
        run_git(cmd.args(args), args).await
    }
}

async fn run_git(cmd: &mut Command, args: &[&str]) -> Result<String> {
    debug!(?args, "running git");
    let output = cmd
        .output()
        .await
        .map_err(|e| Error::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(Error::Git(format!(
            "git {} failed: {}{}",
            args.join(" "),
            stdout.trim_end(),
            stderr.trim_end()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl Vcs for GitCli {
    async fn clone_repo(&self, remote_url: &str, dir: &Path) -> Result<Box<dyn Checkout>> {
        let dir_arg = dir.to_string_lossy();
        let args = ["clone", "--quiet", remote_url, dir_arg.as_ref()];
        run_git(Command::new("git").args(args), &args).await?;

        Ok(Box::new(GitCheckout {
            dir: dir.to_path_buf(),
            committer: self.committer.clone(),
        }))
    }
}

#[async_trait]
impl Checkout for GitCheckout {
    fn dir(&self) -> &Path {
        &self.dir
    }

    async fn checkout(&self, rev: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", rev]).await.map(|_| ())
    }

    async fn create_branch(&self, name: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", "-b", name]).await.map(|_| ())
    }

    async fn merge(&self, rev: &str) -> Result<String> {
        self.git(&["merge", "--no-edit", rev]).await
    }
}
