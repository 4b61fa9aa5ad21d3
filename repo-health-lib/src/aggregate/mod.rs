//! Weekly aggregation
//!
//! Rolls the daily snapshots of the trailing seven days into one summary per ISO
//! week, written as both JSON and CSV. Re-running on the same day over the same
//! snapshots rewrites identical summaries.

use crate::Result;
use crate::reports::{generate_csv, generate_json};
use crate::storage::ObjectStore;
use crate::worker::raw_day_prefix;
use chrono::{Days, NaiveDate};
use serde_json::{Map, Value};

const LOG_TARGET: &str = " aggregate";

/// Number of days covered by a summary, ending with (and including) the run date.
pub const WINDOW_DAYS: u64 = 7;

/// The dates covered by a summary run on `today`, oldest first.
#[must_use]
pub fn window(today: NaiveDate) -> Vec<NaiveDate> {
    (0..WINDOW_DAYS).rev().map(|back| today - Days::new(back)).collect()
}

/// ISO week id of `today`, e.g. `2024-W18`.
#[must_use]
pub fn week_id(today: NaiveDate) -> String {
    today.format("%G-W%V").to_string()
}

/// Result of an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateOutcome {
    /// No snapshots in the window; nothing was written
    NoData,

    Written {
        week: String,
        records: usize,
        json_key: String,
        csv_key: String,
    },
}

#[derive(Debug)]
pub struct WeeklyAggregator<'a> {
    store: &'a dyn ObjectStore,
    daily_prefix: String,
    weekly_prefix: String,
}

impl<'a> WeeklyAggregator<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ObjectStore, daily_prefix: impl Into<String>, weekly_prefix: impl Into<String>) -> Self {
        Self {
            store,
            daily_prefix: daily_prefix.into(),
            weekly_prefix: weekly_prefix.into(),
        }
    }

    /// Merge the snapshots of the window ending `today` and write the weekly summary.
    pub async fn aggregate(&self, today: NaiveDate) -> Result<AggregateOutcome> {
        let records = self.collect(today).await?;
        let week = week_id(today);

        if records.is_empty() {
            log::info!(target: LOG_TARGET, "No snapshots in the 7 days ending {today}, nothing to write for {week}");
            return Ok(AggregateOutcome::NoData);
        }

        let json_key = format!("{}{week}/summary.json", self.weekly_prefix);
        let csv_key = format!("{}{week}/summary.csv", self.weekly_prefix);

        self.store.put(&json_key, generate_json(&records)?).await?;
        self.store.put(&csv_key, generate_csv(&records)?).await?;

        log::info!(target: LOG_TARGET, "Wrote {} record(s) for {week} to '{json_key}' and '{csv_key}'", records.len());

        Ok(AggregateOutcome::Written {
            week,
            records: records.len(),
            json_key,
            csv_key,
        })
    }

    /// Read every parseable snapshot in the window, oldest day first, keys sorted within a day.
    pub async fn collect(&self, today: NaiveDate) -> Result<Vec<Map<String, Value>>> {
        let mut records = Vec::new();

        for day in window(today) {
            let prefix = raw_day_prefix(&self.daily_prefix, day);
            let mut keys: Vec<String> = self
                .store
                .list(&prefix)
                .await?
                .into_iter()
                .filter(|key| key.ends_with(".json"))
                .collect();
            keys.sort();

            log::debug!(target: LOG_TARGET, "Found {} snapshot(s) under '{prefix}'", keys.len());

            for key in keys {
                let bytes = match self.store.get(&key).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        log::warn!(target: LOG_TARGET, "Skipping unreadable snapshot '{key}': {e}");
                        continue;
                    }
                };

                match serde_json::from_slice::<Value>(&bytes) {
                    Ok(Value::Object(record)) => records.push(record),
                    Ok(_) => log::warn!(target: LOG_TARGET, "Skipping snapshot '{key}': not a JSON object"),
                    Err(e) => log::warn!(target: LOG_TARGET, "Skipping snapshot '{key}': {e}"),
                }
            }
        }

        Ok(records)
    }
}
