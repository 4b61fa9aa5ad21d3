use super::Host;
use super::common::{CommonArgs, Setting};
use crate::Result;
use crate::storage::{MemoryObjectStore, ObjectStore};
use crate::worker::{HealthWorker, RepoName, WorkerSettings};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use ohno::{IntoAppError, bail};
use std::io::Write;

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Repositories to analyze
    #[arg(value_name = "OWNER/NAME", required = true)]
    pub repos: Vec<String>,

    /// Days of commit history to count
    #[arg(long, value_name = "DAYS", default_value_t = 30)]
    pub commit_window_days: u32,

    /// Also write each snapshot to the daily layout in the bucket
    #[arg(long)]
    pub store: bool,

    /// Snapshot date (default is today, UTC)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

/// Fetch named repositories directly, bypassing the queue, and print their snapshots.
pub async fn analyze_repos<H: Host>(host: &mut H, args: &AnalyzeArgs) -> Result<()> {
    let config = args.common.init()?;

    let repos = args.repos.iter().map(|r| RepoName::parse(r)).collect::<Result<Vec<_>>>()?;
    if args.commit_window_days == 0 {
        bail!("--commit-window-days must be greater than 0");
    }

    if args.store {
        args.common.require(&[Setting::Bucket, Setting::GithubToken])?;
    } else {
        args.common.require(&[Setting::GithubToken])?;
    }

    // Without --store, snapshots only live for the duration of the command
    let store: Box<dyn ObjectStore> = if args.store {
        Box::new(args.common.open_store()?)
    } else {
        Box::new(MemoryObjectStore::new())
    };

    let client = args.common.api_client(&config)?;
    let settings = WorkerSettings {
        commit_window_days: args.commit_window_days,
        ..config.worker_settings()
    };
    let worker = HealthWorker::new(&client, store.as_ref(), settings);

    let now = Utc::now();
    let snapshot_date = args.date.unwrap_or_else(|| now.date_naive());
    let mut unavailable = 0;

    for repo in &repos {
        let Some(snapshot) = worker.evaluate(repo, snapshot_date, now).await else {
            let _ = writeln!(host.error(), "Could not fetch '{repo}'");
            unavailable += 1;
            continue;
        };

        let json = serde_json::to_string_pretty(&snapshot).into_app_err_with(|| format!("serializing snapshot of '{repo}'"))?;
        let _ = writeln!(host.output(), "{json}");

        if args.store {
            let key = worker.store_snapshot(&snapshot).await?;
            let _ = writeln!(host.output(), "Stored at '{key}'");
        }
    }

    if unavailable == repos.len() {
        host.exit(1);
    }

    Ok(())
}
