//! Merge gating
//!
//! Three-phase pattern:
//! 1. Gather - fetch a PR snapshot and count reviews (effectful, bounded)
//! 2. Evaluate - decide eligibility from gathered data (pure, testable)
//! 3. Execute - re-validate and merge (effectful)

mod eligibility;
mod execute;

pub use eligibility::{Blocker, ELIGIBLE_REASON, EligibilityInput, Verdict, evaluate_eligibility};
pub use execute::{MergeAttempt, MergeRequest, execute_merge};
