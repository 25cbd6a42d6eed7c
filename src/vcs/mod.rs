//! Version-control operations used for merge simulation

mod git;

pub use git::{GitCheckout, GitCli};

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Clones repositories into a workspace
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Clone `remote_url` into `dir` and return a handle on the working copy
    async fn clone_repo(&self, remote_url: &str, dir: &Path) -> Result<Box<dyn Checkout>>;
}

/// Operations on a cloned working copy
#[async_trait]
pub trait Checkout: Send + Sync {
    /// Working copy root
    fn dir(&self) -> &Path;

    /// Check out a commit or branch
    async fn checkout(&self, rev: &str) -> Result<()>;

    /// Create a branch at HEAD and switch to it
    async fn create_branch(&self, name: &str) -> Result<()>;

    /// Merge `rev` into the current branch, returning git's summary
    async fn merge(&self, rev: &str) -> Result<String>;
}
