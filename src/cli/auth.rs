//! Auth command - check GitHub credentials

use crate::cli::style::{Stylize, check};
use anstream::println;
use std::path::Path;
use thumbs::auth::{get_github_auth, test_github_auth};
use thumbs::error::Result;

/// Resolve credentials and report who they authenticate as
pub async fn run_auth(settings_path: Option<&Path>) -> Result<()> {
    let settings = crate::cli::context::load_settings(settings_path)?;
    let auth = get_github_auth().await?;
    println!("{} {}", "Token source:".muted(), auth.source.to_string().accent());

    let login = test_github_auth(&auth, settings.api_host.as_deref()).await?;
    println!("{} Authenticated as {}", check(), login.emphasis());
    Ok(())
}
