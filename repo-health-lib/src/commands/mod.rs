//! Command-line interface and orchestration for repo-health
//!
//! This module implements the CLI commands and wires the pipeline stages to their
//! collaborators: the GitHub client, the object store, and the work queue. It
//! handles argument parsing, configuration loading, and logging setup.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **discover**: Search GitHub per configured language and enqueue one work item
//!   per repository, or write the results to a CSV table (`--mode export`)
//! - **work**: Drain the queue in batches, storing one snapshot per repository per day
//! - **aggregate**: Merge the last 7 days of snapshots into a weekly summary
//! - **analyze**: Fetch named repositories directly and print their snapshots
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. Pipeline commands first set up logging and load
//! the configuration, then check that every deployment value they need (bucket,
//! queue URL, token) is present before doing any work.
//!
//! Tuning lives in a TOML file (`repo-health.toml`); deployment values come from
//! command-line flags or their environment variables.

mod aggregate;
mod analyze;
mod common;
mod config;
mod discover;
mod host;
mod init;
mod run;
mod validate;
mod work;

pub use aggregate::{AggregateArgs, aggregate_week};
pub use analyze::{AnalyzeArgs, analyze_repos};
pub use common::{CommonArgs, LogLevel, Setting};
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
pub use discover::{DiscoverArgs, discover_repos};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
pub use work::{WorkArgs, process_queue};
