//! thumbs - validation and merge gating for pull requests
//!
//! A pull request is cloned, its head merged onto its base in a scratch
//! workspace, and the repository's build steps run there. The outcomes land
//! in a [`ledger::BuildStatus`]. Together with `+1` reviews and the
//! repository's `.thumbs.yml`, that ledger decides whether the PR may be
//! merged automatically.

pub mod auth;
pub mod command;
pub mod config;
pub mod error;
pub mod gate;
pub mod integration;
pub mod ledger;
pub mod merge;
pub mod platform;
pub mod report;
pub mod review;
pub mod settings;
pub mod types;
pub mod vcs;
