//! GitHub authentication

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use octocrab::Octocrab;
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

/// Get GitHub authentication
///
/// Checks `GITHUB_TOKEN`, then `GH_TOKEN`, then `gh auth token`.
pub async fn get_github_auth() -> Result<GitHubAuthConfig> {
    if let Some(token) = token_from_env(|name| std::env::var(name).ok()) {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        });
    }

    if let Some(token) = token_from_gh_cli().await {
        debug!("using GitHub token from gh CLI");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    Err(Error::Auth(
        "No GitHub authentication found. Run `gh auth login` or set GITHUB_TOKEN".to_string(),
    ))
}

fn token_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    TOKEN_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

async fn token_from_gh_cli() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().await.ok()?;
    if !output.status.success() {
        debug!(status = ?output.status, "gh auth token failed");
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

/// Check the token works; returns the authenticated login
pub async fn test_github_auth(config: &GitHubAuthConfig, host: Option<&str>) -> Result<String> {
    let mut builder = Octocrab::builder().personal_token(config.token.clone());
    if let Some(h) = host {
        builder = builder
            .base_uri(format!("https://{h}/api/v3"))
            .map_err(|e| Error::Auth(e.to_string()))?;
    }
    let client = builder.build().map_err(|e| Error::Auth(e.to_string()))?;

    let user = client
        .current()
        .user()
        .await
        .map_err(|e| Error::Auth(format!("token rejected: {e}")))?;
    debug!(login = %user.login, "authenticated");
    Ok(user.login)
}
