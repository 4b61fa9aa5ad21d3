use super::Host;
use super::common::{CommonArgs, Setting};
use crate::Result;
use crate::discovery::{DiscoveryMode, discover, export_rows, fan_out, write_export};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct DiscoverArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Where to send results, overriding `discovery_mode` from the configuration
    #[arg(long, value_name = "MODE")]
    pub mode: Option<DiscoveryMode>,

    /// Snapshot date stamped on the results (default is today, UTC)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

pub async fn discover_repos<H: Host>(host: &mut H, args: &DiscoverArgs) -> Result<()> {
    let config = args.common.init()?;
    let mode = args.mode.unwrap_or(config.discovery_mode);
    let snapshot_date = args.date.unwrap_or_else(|| Utc::now().date_naive());

    match mode {
        DiscoveryMode::Queue => {
            args.common.require(&[Setting::QueueUrl, Setting::GithubToken])?;
            let queue = args.common.open_queue()?;
            let client = args.common.api_client(&config)?;

            for filter in config.discovery_filters() {
                let discovery = discover(&client, &filter).await;
                let report = fan_out(&queue, &discovery.work_items(snapshot_date)).await;

                let _ = writeln!(
                    host.output(),
                    "{}: enqueued {} of {} repositories ({})",
                    filter.language,
                    report.sent,
                    discovery.repos.len(),
                    discovery.end
                );

                if report.failed > 0 {
                    let _ = writeln!(host.error(), "{}: {} work item(s) could not be enqueued", filter.language, report.failed);
                }
            }
        }

        DiscoveryMode::Export => {
            args.common.require(&[Setting::Bucket, Setting::GithubToken])?;
            let store = args.common.open_store()?;
            let client = args.common.api_client(&config)?;

            let rows = export_rows(&client, &config.discovery_filters(), snapshot_date).await;
            let key = write_export(&store, &rows, snapshot_date).await?;

            let _ = writeln!(host.output(), "Exported {} repositories to '{key}'", rows.len());
        }
    }

    Ok(())
}
