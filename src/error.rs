//! Error types for thumbs

use thiserror::Error;

/// Errors surfaced by the engine and its collaborators
///
/// Step and integration failures are never returned through this type; they
/// are recorded in the build ledger. What reaches the caller as `Err` is a
/// failure the engine cannot recover from on its own, mostly provider calls.
#[derive(Debug, Error)]
pub enum Error {
    /// Octocrab request failed
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// GitHub returned something we could not use
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// git invocation failed
    #[error("git error: {0}")]
    Git(String),

    /// External command could not be started or awaited
    #[error("command error: {0}")]
    Command(String),

    /// External command exceeded its time budget
    #[error("command timed out after {secs} seconds")]
    Timeout {
        /// Budget that was exceeded
        secs: u64,
    },

    /// Configuration or settings could not be read
    #[error("config error: {0}")]
    Config(String),

    /// Build workspace could not be prepared
    #[error("workspace error: {0}")]
    Workspace(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Repository identifier is not `owner/name`
    #[error("invalid repository identifier: {0}")]
    InvalidRepo(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the source-control provider.
    ///
    /// Provider failures during evaluation propagate to the caller; the
    /// engine never retries them.
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Octocrab(_) | Self::GitHubApi(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
