//! Terminal styling helpers
//!
//! Colors only apply when the stream supports them; `anstream` strips them
//! otherwise.

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream, Style};
use std::fmt::Display;

/// Check mark used for completed items
pub const CHECK: &str = "✓";

/// Cross used for failed items
pub const CROSS: &str = "✗";

/// Semantic styles for CLI output
pub trait Stylize: Display + Sized {
    /// Secondary text
    fn muted(&self) -> String {
        self.styled(Style::new().dimmed())
    }

    /// Headings and names
    fn emphasis(&self) -> String {
        self.styled(Style::new().bold())
    }

    /// Identifiers (step names, refs)
    fn accent(&self) -> String {
        self.styled(Style::new().cyan())
    }

    /// Positive outcome
    fn success(&self) -> String {
        self.styled(Style::new().green())
    }

    /// Negative or attention-worthy outcome
    fn warn(&self) -> String {
        self.styled(Style::new().yellow())
    }

    /// Hard failure
    fn failure(&self) -> String {
        self.styled(Style::new().red().bold())
    }

    #[doc(hidden)]
    fn styled(&self, style: Style) -> String {
        self.if_supports_color(Stream::Stdout, |s| s.style(style))
            .to_string()
    }
}

impl<T: Display> Stylize for T {}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}

/// Styled cross
pub fn cross() -> String {
    CROSS.failure()
}

/// Spinner style for long-running steps
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}
