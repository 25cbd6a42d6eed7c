//! External command execution
//!
//! Build steps are arbitrary shell commands from `.thumbs.yml`. The runner
//! only needs an exit code and the combined output.

mod shell;

pub use shell::ShellCommandRunner;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Output of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// stdout and stderr, interleaved
    pub output: String,
}

impl CommandOutput {
    /// Whether the command exited with status zero
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Runs a shell command in a directory
///
/// Returns `Err` when the command could not be started or ran past its
/// `timeout` (`Error::Timeout`). A non-zero exit is a normal `Ok` result.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` in `cwd`
    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput>;
}
