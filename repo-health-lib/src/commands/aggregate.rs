use super::Host;
use super::common::{CommonArgs, Setting};
use crate::Result;
use crate::aggregate::{AggregateOutcome, WeeklyAggregator};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct AggregateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Last day of the 7-day window (default is today, UTC)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

pub async fn aggregate_week<H: Host>(host: &mut H, args: &AggregateArgs) -> Result<()> {
    let config = args.common.init()?;
    args.common.require(&[Setting::Bucket])?;

    let store = args.common.open_store()?;
    let today = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let aggregator = WeeklyAggregator::new(&store, config.daily_prefix, config.weekly_prefix);

    match aggregator.aggregate(today).await? {
        AggregateOutcome::NoData => {
            let _ = writeln!(host.output(), "No snapshots in the 7 days ending {today}, nothing written");
        }
        AggregateOutcome::Written {
            week,
            records,
            json_key,
            csv_key,
        } => {
            let _ = writeln!(host.output(), "Wrote {records} record(s) for {week}");
            let _ = writeln!(host.output(), "  {json_key}");
            let _ = writeln!(host.output(), "  {csv_key}");
        }
    }

    Ok(())
}
