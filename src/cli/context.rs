//! Shared command context for CLI commands
//!
//! Extracts the setup shared by every command that talks to GitHub.

use std::path::Path;
use thumbs::auth::get_github_auth;
use thumbs::error::{Error, Result};
use thumbs::platform::{GitHubService, PlatformService};
use thumbs::settings::Settings;
use thumbs::types::RepoId;
use thumbs::vcs::GitCli;
use tracing::debug;

/// Shared context for CLI commands that interact with the platform
///
/// This struct encapsulates:
/// - Loading driver settings
/// - Resolving credentials
/// - Creating the platform service for the repository
/// - Building the git driver with the configured committer
pub struct CommandContext {
    /// Driver settings
    pub settings: Settings,
    /// Repository being worked on
    pub repo: RepoId,
    /// Platform service bound to `repo`
    pub platform: Box<dyn PlatformService>,
    /// Git driver
    pub vcs: GitCli,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// `settings_path` overrides the default settings location.
    pub async fn new(repo: &str, settings_path: Option<&Path>) -> Result<Self> {
        let settings = load_settings(settings_path)?;
        let repo: RepoId = repo.parse()?;

        let auth = get_github_auth().await?;
        debug!(source = %auth.source, "resolved GitHub credentials");
        let platform =
            GitHubService::new(&auth.token, repo.clone(), settings.api_host.clone())?;

        let vcs = match &settings.committer {
            Some((name, email)) => GitCli::new().with_committer(name, email),
            None => GitCli::new(),
        };

        Ok(Self {
            settings,
            repo,
            platform: Box::new(platform),
            vcs,
        })
    }
}

/// Load settings from `path`, or from the default location when `None`
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) if !p.exists() => Err(Error::Config(format!(
            "settings file not found: {}",
            p.display()
        ))),
        Some(p) => Settings::load(p),
        None => Settings::default_path().map_or_else(|| Ok(Settings::default()), |p| Settings::load(&p)),
    }
}
