//! Command dispatch logic for repo-health

use super::{
    AggregateArgs, AnalyzeArgs, DiscoverArgs, InitArgs, ValidateArgs, WorkArgs, aggregate_week, analyze_repos, discover_repos,
    init_config, process_queue, validate_config,
};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "repo-health", version, author, long_about = None)]
#[command(about = "Track the health of GitHub repositories over time")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for repositories and enqueue them, or export them as CSV
    Discover(Box<DiscoverArgs>),
    /// Process queued work items into daily snapshots
    Work(Box<WorkArgs>),
    /// Roll the last 7 days of snapshots into a weekly summary
    Aggregate(Box<AggregateArgs>),
    /// Fetch and score specific repositories directly
    Analyze(Box<AnalyzeArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Discover(discover_args) => discover_repos(host, discover_args).await,
        Command::Work(work_args) => process_queue(host, work_args).await,
        Command::Aggregate(aggregate_args) => aggregate_week(host, aggregate_args).await,
        Command::Analyze(analyze_args) => analyze_repos(host, analyze_args).await,
        Command::Init(init_args) => init_config(host, init_args),
        Command::Validate(validate_args) => validate_config(host, validate_args),
    }
}
