//! Merge eligibility - pure decision function
//!
//! No I/O happens here. The caller gathers a PR snapshot, the ledger, the
//! config and the review count, and gets back a [`Verdict`]. Preconditions
//! are checked in a fixed order and the first one that fails is the only
//! reason reported.

use crate::config::ThumbsConfig;
use crate::ledger::{BuildStatus, MERGE_STEP};
use crate::types::{MergeableState, PrState, PullRequestSnapshot};

/// Reason reported for an eligible verdict
pub const ELIGIBLE_REASON: &str = "all merge preconditions met";

/// The first unmet precondition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    /// PR is closed or merged
    NotOpen(PrState),
    /// Provider does not report the PR as mergeable
    NotMergeable,
    /// Merge state is anything but clean
    NotClean(MergeableState),
    /// No merge simulation was recorded
    MergeStepMissing,
    /// Some recorded steps are not ok
    StepsNotOk(Vec<String>),
    /// No `.thumbs.yml`
    ConfigMissing,
    /// `.thumbs.yml` lacks `minimum_reviewers`
    MinimumReviewersMissing,
    /// Not enough qualifying reviews yet
    InsufficientReviews {
        /// Qualifying reviews counted
        have: usize,
        /// Reviews required
        need: u64,
    },
    /// `merge` is not exactly `true`; carries the configured value
    MergeDisabled(String),
}

impl Blocker {
    /// Comment the caller must post alongside this verdict, if any
    #[must_use]
    pub fn notification(&self) -> Option<String> {
        match self {
            Self::InsufficientReviews { need, .. } => {
                let plural = if *need > 1 { "s" } else { "" };
                Some(format!("Waiting for at least {need} code review{plural}"))
            }
            Self::MergeDisabled(value) => Some(format!(
                "No Automerge:  *.thumbs.yml* says ```merge: {value}```"
            )),
            _ => None,
        }
    }
}

impl std::fmt::Display for Blocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOpen(state) => write!(f, "pull request is not open (state: {state})"),
            Self::NotMergeable => write!(f, "pull request is not mergeable"),
            Self::NotClean(state) => write!(f, "mergeable state is not clean ({state})"),
            Self::MergeStepMissing => write!(f, "merge step has not been recorded"),
            Self::StepsNotOk(steps) => write!(f, "build steps not ok: {}", steps.join(", ")),
            Self::ConfigMissing => write!(f, "no usable .thumbs.yml"),
            Self::MinimumReviewersMissing => write!(f, "minimum_reviewers is not configured"),
            Self::InsufficientReviews { have, need } => {
                write!(f, "waiting for reviews ({have} of {need})")
            }
            Self::MergeDisabled(_) => write!(f, "automatic merge disabled by configuration"),
        }
    }
}

/// Eligibility decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the PR may be merged automatically
    pub eligible: bool,
    /// Human-readable reasons (the failing precondition, or the satisfied one)
    pub reasons: Vec<String>,
    /// Failing precondition, `None` when eligible
    pub blocker: Option<Blocker>,
}

impl Verdict {
    fn eligible() -> Self {
        Self {
            eligible: true,
            reasons: vec![ELIGIBLE_REASON.to_string()],
            blocker: None,
        }
    }

    fn blocked(blocker: Blocker) -> Self {
        Self {
            eligible: false,
            reasons: vec![blocker.to_string()],
            blocker: Some(blocker),
        }
    }

    /// Comment to post for this verdict, if any
    #[must_use]
    pub fn notification(&self) -> Option<String> {
        self.blocker.as_ref().and_then(Blocker::notification)
    }
}

/// Everything the evaluator looks at
#[derive(Debug, Clone, Copy)]
pub struct EligibilityInput<'a> {
    /// PR state fetched for this evaluation
    pub snapshot: &'a PullRequestSnapshot,
    /// Validation ledger
    pub ledger: &'a BuildStatus,
    /// Repository config, if one was found
    pub config: Option<&'a ThumbsConfig>,
    /// Qualifying review count under the active policy
    pub review_count: usize,
}

/// Decide whether a PR may be merged automatically (PURE)
///
/// Checks, in order: open, mergeable, clean, merge step recorded, every step
/// ok, config with `minimum_reviewers`, enough reviews, `merge: true`.
#[must_use]
pub fn evaluate_eligibility(input: &EligibilityInput<'_>) -> Verdict {
    check_preconditions(input).map_or_else(Verdict::eligible, Verdict::blocked)
}

fn check_preconditions(input: &EligibilityInput<'_>) -> Option<Blocker> {
    let snapshot = input.snapshot;

    if snapshot.state != PrState::Open {
        return Some(Blocker::NotOpen(snapshot.state));
    }
    if snapshot.mergeable != Some(true) {
        return Some(Blocker::NotMergeable);
    }
    if snapshot.mergeable_state != MergeableState::Clean {
        return Some(Blocker::NotClean(snapshot.mergeable_state));
    }

    if !input.ledger.contains(MERGE_STEP) {
        return Some(Blocker::MergeStepMissing);
    }
    if !input.ledger.all_steps_ok() {
        let problems = input
            .ledger
            .problem_steps()
            .into_iter()
            .map(String::from)
            .collect();
        return Some(Blocker::StepsNotOk(problems));
    }

    let Some(config) = input.config else {
        return Some(Blocker::ConfigMissing);
    };
    let Some(need) = config.minimum_reviewers else {
        return Some(Blocker::MinimumReviewersMissing);
    };

    if (input.review_count as u64) < need {
        return Some(Blocker::InsufficientReviews {
            have: input.review_count,
            need,
        });
    }

    if !config.merge_enabled() {
        return Some(Blocker::MergeDisabled(config.merge_display()));
    }

    None
}
