//! CLI commands

pub mod auth;
pub mod context;
pub mod style;
pub mod validate;

use anstream::{eprintln, println};
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::sync::Mutex;
use std::time::Duration;
use style::{Stylize, check, cross, spinner_style};
use thumbs::integration::ProgressCallback;
use thumbs::ledger::{StepResult, StepStatus};

/// Where progress lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStream {
    /// Alongside the command's normal output
    Stdout,
    /// Out of the way of machine-readable stdout
    Stderr,
}

/// Terminal progress: one spinner per running step, one line per result
pub struct CliProgress {
    spinner: Mutex<Option<ProgressBar>>,
    quiet: bool,
    stream: ProgressStream,
}

impl CliProgress {
    /// Spinner while a step runs, a summary line when it finishes
    pub const fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            quiet: false,
            stream: ProgressStream::Stdout,
        }
    }

    /// Results only, no spinner, and nothing on stdout
    pub const fn compact() -> Self {
        Self {
            spinner: Mutex::new(None),
            quiet: true,
            stream: ProgressStream::Stderr,
        }
    }

    /// Stream that result lines and messages are written to
    pub const fn stream(&self) -> ProgressStream {
        self.stream
    }

    fn emit(&self, line: &str) {
        match self.stream {
            ProgressStream::Stdout => println!("{line}"),
            ProgressStream::Stderr => eprintln!("{line}"),
        }
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.spinner.lock().ok().and_then(|mut s| s.take())
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_step_started(&self, name: &str) {
        if self.quiet {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!("Running {}...", name.accent()));
        spinner.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(spinner) {
                previous.finish_and_clear();
            }
        }
    }

    async fn on_step_finished(&self, status: &StepStatus) {
        let mark = match status.result {
            Some(StepResult::Ok) => check(),
            _ => cross(),
        };
        let line = format!("{mark} {} {}", status.name.accent(), status.message.muted());
        match self.take_spinner() {
            Some(spinner) => spinner.finish_with_message(line),
            None => self.emit(&line),
        }
    }

    async fn on_message(&self, message: &str) {
        match self.spinner.lock().ok().as_deref() {
            Some(Some(spinner)) => spinner.println(message),
            _ => self.emit(message),
        }
    }
}
