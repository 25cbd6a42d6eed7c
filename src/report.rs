//! PR comments describing a validation run
//!
//! Step output is uploaded as pastes first ([`upload_step_outputs`]); the
//! rendering functions below are pure and take the resulting links.

use crate::error::Result;
use crate::ledger::{BuildStatus, StepResult, StepStatus};
use crate::platform::PlatformService;
use crate::review::ReviewComment;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use tracing::debug;

/// Step name to paste URL
pub type PasteLinks = HashMap<String, String>;

/// Review tally shown at the bottom of the build status comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Qualifying reviews counted
    pub count: usize,
    /// Reviews required
    pub minimum: u64,
    /// Organization, when counting in org mode
    pub org: Option<String>,
}

/// Upload the output of every step that captured some
pub async fn upload_step_outputs(
    platform: &dyn PlatformService,
    ledger: &BuildStatus,
) -> Result<PasteLinks> {
    let mut links = PasteLinks::new();
    for step in ledger.iter() {
        let Some(output) = step.output.as_deref() else {
            continue;
        };
        let url = platform
            .create_paste(&format!("{}.txt", step.name), output)
            .await?;
        links.insert(step.name.clone(), url);
    }
    debug!(pastes = links.len(), "uploaded step outputs");
    Ok(links)
}

fn result_image(result: Option<StepResult>) -> &'static str {
    match result {
        Some(StepResult::Ok) => ":white_check_mark:",
        Some(StepResult::Error) => ":no_entry:",
        None => "",
    }
}

fn result_label(result: Option<StepResult>) -> String {
    result.map_or_else(|| "PENDING".to_string(), |r| r.to_string().to_uppercase())
}

/// Title line for a ledger
#[must_use]
pub fn status_title(ledger: &BuildStatus) -> String {
    if ledger.aggregate_result() == StepResult::Ok {
        "Looks good!  :+1:".to_string()
    } else {
        format!(
            "Looks like there's an issue with build step {} !  :cloud: ",
            ledger.problem_steps().join(",")
        )
    }
}

fn render_step(out: &mut String, step: &StepStatus, paste: Option<&str>) {
    let label = result_label(step.result);
    let _ = writeln!(out, "<details>");
    let _ = writeln!(
        out,
        " <summary>{} {}   {} </summary>\n",
        result_image(step.result),
        step.name.to_uppercase(),
        label
    );
    let _ = writeln!(out, " <p>\n");
    let _ = writeln!(
        out,
        "> Started at: {}",
        step.started_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(secs) = step.duration_secs() {
        let _ = writeln!(out, "> Duration: {secs} seconds.");
    }
    let _ = writeln!(out, "> Result:  {label}");
    let _ = writeln!(out, "> Message: {}", step.message);
    let exit = step
        .exit_code
        .map_or_else(|| label.clone(), |code| code.to_string());
    let _ = writeln!(out, "> Exit Code:  {exit}");
    if let Some(url) = paste {
        let _ = writeln!(out, "> <a href=\"{url}\">:page_facing_up:</a>");
    }
    let _ = writeln!(out, "</p>\n\n```\n");
    if let Some(command) = &step.command {
        let _ = writeln!(out, "{command}\n");
    }
    if let Some(output) = &step.output {
        let _ = writeln!(out, "{}\n", output.trim_end());
    }
    let _ = writeln!(out, "```\n");
    let _ = writeln!(out, "--------------------------------------------------\n");
    let _ = writeln!(out, "</details>\n");
}

/// Build status comment: title, one collapsible block per step, review tally
#[must_use]
pub fn render_build_status_comment(
    ledger: &BuildStatus,
    pastes: &PasteLinks,
    reviews: &ReviewSummary,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<p>Build Status: {}</p>", status_title(ledger));

    for step in ledger.iter() {
        render_step(&mut out, step, pastes.get(&step.name).map(String::as_str));
    }

    let image = if reviews.count as u64 >= reviews.minimum {
        ":white_check_mark:"
    } else {
        ":warning:"
    };
    let scope = reviews
        .org
        .as_ref()
        .map_or_else(|| ".".to_string(), |org| format!(" from organization {org}"));
    let _ = writeln!(
        out,
        "{image} {} of {} Code reviews{scope}",
        reviews.count, reviews.minimum
    );
    out
}

/// `Code reviews from: *@a*, *@b*.` with each login once, in first-seen order
#[must_use]
pub fn render_reviewers_comment(reviews: &[ReviewComment]) -> String {
    let mut seen = HashSet::new();
    let logins: Vec<String> = reviews
        .iter()
        .filter(|r| seen.insert(r.author_login.as_str()))
        .map(|r| format!("*@{}*", r.author_login))
        .collect();
    format!("Code reviews from: {}.", logins.join(", "))
}
