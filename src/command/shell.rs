//! `sh -c` command runner

use crate::command::{CommandOutput, CommandRunner};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs commands through `sh -c` with stderr folded into stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        debug!(command, cwd = %cwd.display(), ?timeout, "running command");

        // Group the command so redirection covers every part of a compound line
        let script = format!("{{ {command}\n}} 2>&1");
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&script)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down everything sh forked
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| Error::Command(format!("failed to start `{command}`: {e}")))?;
        let pid = child.id();

        let output = match timeout {
            Some(limit) => {
                let Ok(output) = tokio::time::timeout(limit, child.wait_with_output()).await
                else {
                    if let Some(pid) = pid {
                        kill_process_group(pid).await;
                    }
                    warn!(command, ?limit, "command timed out");
                    return Err(Error::Timeout {
                        secs: secs_rounded_up(limit),
                    });
                };
                output
            }
            None => child.wait_with_output().await,
        }
        .map_err(|e| Error::Command(format!("failed to wait for `{command}`: {e}")))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        let result = CommandOutput {
            exit_code: output.status.code(),
            output: combined,
        };
        debug!(command, exit_code = ?result.exit_code, "command finished");
        Ok(result)
    }
}

/// Whole seconds in `limit`, counting any fraction as a full second
const fn secs_rounded_up(limit: Duration) -> u64 {
    if limit.subsec_nanos() > 0 {
        limit.as_secs() + 1
    } else {
        limit.as_secs()
    }
}

/// SIGKILL every process in group `pgid`. The group leader is already gone
/// by now (`kill_on_drop`), but its background children are not.
#[cfg(unix)]
async fn kill_process_group(pgid: u32) {
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -KILL -- -{pgid} 2>/dev/null"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    debug!(pgid, ?status, "killed process group");
}

#[cfg(not(unix))]
async fn kill_process_group(_pgid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_captures_interleaved_output() {
        let temp = TempDir::new().unwrap();
        let result = ShellCommandRunner
            .run("echo out; echo err >&2", temp.path(), None)
            .await
            .unwrap();

        assert!(result.success());
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[tokio::test]
    async fn test_run_reports_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let result = ShellCommandRunner
            .run("exit 3", temp.path(), None)
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(result.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_run_uses_working_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "here").unwrap();
        let result = ShellCommandRunner
            .run("cat marker.txt", temp.path(), None)
            .await
            .unwrap();

        assert_eq!(result.output.trim(), "here");
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let temp = TempDir::new().unwrap();
        let result = ShellCommandRunner
            .run("sleep 5", temp.path(), Some(Duration::from_millis(100)))
            .await;

        assert!(matches!(result, Err(Error::Timeout { secs: 1 })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_background_children() {
        let temp = TempDir::new().unwrap();
        let result = ShellCommandRunner
            .run(
                "(sleep 1; touch marker) & wait",
                temp.path(),
                Some(Duration::from_millis(200)),
            )
            .await;
        assert!(matches!(result, Err(Error::Timeout { .. })));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!temp.path().join("marker").exists());
    }

    #[test]
    fn test_timeout_secs_round_up() {
        assert_eq!(secs_rounded_up(Duration::from_millis(100)), 1);
        assert_eq!(secs_rounded_up(Duration::from_secs(5)), 5);
        assert_eq!(secs_rounded_up(Duration::from_millis(5001)), 6);
    }
}
