//! Build status ledger - ordered record of verification steps
//!
//! Pure data. The integration runner appends to it, the eligibility
//! evaluator and the report renderer read it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the clone step
pub const CLONE_STEP: &str = "clone";

/// Name of the merge-simulation step
pub const MERGE_STEP: &str = "merge";

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepResult {
    /// Operation reported success
    Ok,
    /// Operation failed
    Error,
}

impl StepResult {
    /// `Ok` when `success`, `Error` otherwise
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Ok } else { Self::Error }
    }
}

impl std::fmt::Display for StepResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Recorded outcome of one named step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    /// Step name, unique within a run
    pub name: String,
    /// When the step started
    pub started_at: DateTime<Utc>,
    /// When the step finished
    pub ended_at: Option<DateTime<Utc>>,
    /// Outcome; `None` means not yet evaluated
    pub result: Option<StepResult>,
    /// Human-readable message
    pub message: String,
    /// Command text for externally-run steps
    pub command: Option<String>,
    /// Captured output
    pub output: Option<String>,
    /// Exit code, only when an external process actually exited
    pub exit_code: Option<i32>,
}

impl StepStatus {
    /// Start a step now, with no result yet
    pub fn started(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Utc::now(),
            ended_at: None,
            result: None,
            message: String::new(),
            command: None,
            output: None,
            exit_code: None,
        }
    }

    /// Finish the step with a result and message
    #[must_use]
    pub fn finish(mut self, result: StepResult, message: impl Into<String>) -> Self {
        self.ended_at = Some(Utc::now());
        self.result = Some(result);
        self.message = message.into();
        self
    }

    /// Attach captured output
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Whether the step finished with `ok`
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result == Some(StepResult::Ok)
    }

    /// Duration in whole seconds, when the step has finished
    #[must_use]
    pub fn duration_secs(&self) -> Option<i64> {
        self.ended_at
            .map(|ended| (ended - self.started_at).num_seconds())
    }
}

/// Ordered mapping of step name to status
///
/// Insertion order is execution order. Recording a name that already exists
/// replaces that entry whole and keeps its slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildStatus {
    steps: Vec<StepStatus>,
}

impl BuildStatus {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step, replacing any earlier entry with the same name
    pub fn record(&mut self, status: StepStatus) {
        match self.steps.iter_mut().find(|s| s.name == status.name) {
            Some(existing) => *existing = status,
            None => self.steps.push(status),
        }
    }

    /// Look up a step by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StepStatus> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Whether a step with this name was recorded
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Whether every step is `ok` and the merge step is present.
    ///
    /// An empty ledger, or one without a merge step, never passes.
    #[must_use]
    pub fn all_steps_ok(&self) -> bool {
        self.contains(MERGE_STEP) && self.steps.iter().all(StepStatus::is_ok)
    }

    /// Names of steps whose result is not `ok`, in execution order
    #[must_use]
    pub fn problem_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| !s.is_ok())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Overall result across recorded steps
    #[must_use]
    pub fn aggregate_result(&self) -> StepResult {
        StepResult::from_success(self.steps.iter().all(StepStatus::is_ok))
    }

    /// Steps in execution order
    pub fn iter(&self) -> impl Iterator<Item = &StepStatus> {
        self.steps.iter()
    }

    /// Number of recorded steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
