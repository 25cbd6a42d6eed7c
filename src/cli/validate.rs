//! Validate command - build a PR, report, and optionally merge it

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use dialoguer::Confirm;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thumbs::command::ShellCommandRunner;
use thumbs::config::YamlConfigSource;
use thumbs::error::{Error, Result};
use thumbs::gate::MergeGate;
use thumbs::integration::ValidationRun;
use thumbs::ledger::StepStatus;
use thumbs::merge::{MergeAttempt, Verdict};

/// Options for the validate command
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Merge when the verdict is eligible
    pub merge: bool,
    /// Validate and evaluate, but post nothing and never merge
    pub dry_run: bool,
    /// Prompt before merging
    pub confirm: bool,
    /// Do not post comments
    pub no_comment: bool,
    /// Workspace override
    pub build_dir: Option<PathBuf>,
    /// Print a JSON report instead of the summary
    pub json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    repo: String,
    pr: u64,
    steps: Vec<&'a StepStatus>,
    eligible: bool,
    reasons: &'a [String],
    merge: Option<&'a MergeAttempt>,
}

/// Run the validate command
#[allow(clippy::future_not_send)]
pub async fn run_validate(
    repo: &str,
    pr_number: u64,
    settings_path: Option<&Path>,
    options: ValidateOptions,
) -> Result<()> {
    // =========================================================================
    // Phase 1: VALIDATE - clone, integrate, run build steps
    // =========================================================================

    let ctx = CommandContext::new(repo, settings_path).await?;
    let commands = ShellCommandRunner;
    let config_source = YamlConfigSource;

    let mut gate = MergeGate::new(
        ctx.platform.as_ref(),
        &ctx.vcs,
        &commands,
        &config_source,
        &ctx.settings,
        pr_number,
    );
    if let Some(dir) = options.build_dir.clone() {
        gate = gate.with_build_dir(dir);
    }

    if !options.json {
        println!(
            "{} {}",
            "Validating".emphasis(),
            format!("{}#{pr_number}", ctx.repo).accent()
        );
        println!("{}", format!("Workspace: {}", gate.build_dir().display()).muted());
    }

    let progress = if options.json {
        CliProgress::compact()
    } else {
        CliProgress::new()
    };
    let run = gate.validate(&progress).await?;

    let post = !options.dry_run && !options.no_comment;
    if post {
        gate.post_build_status(&run).await?;
    }

    // =========================================================================
    // Phase 2: EVALUATE - pure verdict over the gathered state
    // =========================================================================

    let verdict = if post {
        gate.evaluate(&run).await?
    } else {
        gate.assess(&run).await?
    };

    // =========================================================================
    // Phase 3: MERGE - re-validated by the executor
    // =========================================================================

    let mut attempt = None;
    if options.merge && verdict.eligible && !options.dry_run {
        if options.confirm && !confirm_merge(pr_number)? {
            if options.json {
                eprintln!("{}", "Aborted".muted());
            } else {
                println!("{}", "Aborted".muted());
            }
        } else {
            let result = gate.merge(&run, &progress).await?;
            if result.is_merged() && post {
                gate.post_reviewers(&run).await?;
            }
            attempt = Some(result);
        }
    }

    if options.json {
        print_json(&ctx.repo.to_string(), pr_number, &run, &verdict, attempt.as_ref())?;
    } else {
        print_summary(&run, &verdict, attempt.as_ref(), &options);
    }
    Ok(())
}

fn confirm_merge(pr_number: u64) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!("Merge PR #{pr_number}?"))
        .default(false)
        .interact()
        .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))
}

fn print_json(
    repo: &str,
    pr_number: u64,
    run: &ValidationRun,
    verdict: &Verdict,
    attempt: Option<&MergeAttempt>,
) -> Result<()> {
    let report = JsonReport {
        repo: repo.to_string(),
        pr: pr_number,
        steps: run.ledger.iter().collect(),
        eligible: verdict.eligible,
        reasons: &verdict.reasons,
        merge: attempt,
    };
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::Internal(format!("Failed to serialize report: {e}")))?;
    println!("{json}");
    Ok(())
}

fn print_summary(
    run: &ValidationRun,
    verdict: &Verdict,
    attempt: Option<&MergeAttempt>,
    options: &ValidateOptions,
) {
    println!();
    if run.ledger.all_steps_ok() {
        println!("{} Build passed", check());
    } else {
        println!(
            "{} Build problems: {}",
            cross(),
            run.ledger.problem_steps().join(", ").warn()
        );
    }

    if verdict.eligible {
        println!("{} Eligible for merge", check());
    } else {
        println!("{} Not eligible for merge", cross());
    }
    for reason in &verdict.reasons {
        println!("    - {}", reason.muted());
    }

    match attempt {
        Some(a) if a.is_merged() => println!("{} {}", check(), a.message.success()),
        Some(a) => {
            println!("{} {}", cross(), a.message.warn());
            if let Some(output) = &a.output {
                println!("          {}", output.muted());
            }
        }
        None if options.dry_run && verdict.eligible => {
            println!("{}", "Run without --dry-run to post results and merge.".muted());
        }
        None if verdict.eligible && !options.merge => {
            println!("{}", "Run with --merge to merge.".muted());
        }
        None => {}
    }
}
