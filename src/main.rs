//! thumbs - validate pull requests and merge them when they pass

mod cli;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cli::validate::{ValidateOptions, run_validate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "thumbs")]
#[command(about = "Validate pull requests and merge them once builds pass and reviews are in")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone and build a PR, post the results, and optionally merge it
    Validate {
        /// Repository as owner/name
        repo: String,

        /// Pull request number
        pr: u64,

        /// Merge the PR when it is eligible
        #[arg(long)]
        merge: bool,

        /// Validate and evaluate without posting or merging
        #[arg(long)]
        dry_run: bool,

        /// Ask before merging
        #[arg(long)]
        confirm: bool,

        /// Do not post comments on the PR
        #[arg(long)]
        no_comment: bool,

        /// Workspace directory (defaults to one under the build root)
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },

    /// Check GitHub credentials
    Auth,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "thumbs=debug" } else { "thumbs=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = cli.settings.as_deref();

    match cli.command {
        Commands::Validate {
            repo,
            pr,
            merge,
            dry_run,
            confirm,
            no_comment,
            build_dir,
            json,
        } => {
            let options = ValidateOptions {
                merge,
                dry_run,
                confirm,
                no_comment,
                build_dir,
                json,
            };
            run_validate(&repo, pr, settings, options)
                .await
                .with_context(|| format!("validating {repo}#{pr}"))?;
        }
        Commands::Auth => {
            cli::auth::run_auth(settings)
                .await
                .context("checking GitHub authentication")?;
        }
    }

    Ok(())
}
