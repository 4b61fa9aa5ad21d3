use super::{HealthMetrics, RepoName, Snapshot, WorkItem, health_score, snapshot_key};
use crate::Result;
use crate::hosting::{ApiResult, Client, Repository};
use crate::storage::ObjectStore;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeDelta, Utc};
use core::time::Duration;

const LOG_TARGET: &str = "    worker";

/// Tuning for [`HealthWorker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Prefix of the daily snapshot layout, ending in `/`
    pub daily_prefix: String,

    /// How far back to count commits
    pub commit_window_days: u32,

    /// Pause between consecutive items of a batch
    pub item_delay: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            daily_prefix: "health/".to_owned(),
            commit_window_days: 7,
            item_delay: Duration::from_millis(300),
        }
    }
}

/// What happened to one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The snapshot was written under `key`
    Stored { key: String },

    /// Repository metadata was unavailable; nothing was written
    Skipped,
}

/// What happened to one message of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Stored { key: String },
    Skipped,

    /// The message could not be decoded into a work item
    Malformed,

    /// The snapshot could not be written
    Failed,
}

impl ItemOutcome {
    /// Whether the message is done with and can be removed from the queue.
    ///
    /// Only storage failures are worth another delivery.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Per-message outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    #[must_use]
    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Stored { .. }))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped))
    }

    #[must_use]
    pub fn malformed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Malformed))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Turns work items into stored snapshots.
#[derive(Debug)]
pub struct HealthWorker<'a> {
    client: &'a Client,
    store: &'a dyn ObjectStore,
    settings: WorkerSettings,
}

impl<'a> HealthWorker<'a> {
    #[must_use]
    pub const fn new(client: &'a Client, store: &'a dyn ObjectStore, settings: WorkerSettings) -> Self {
        Self { client, store, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Fetch a repository's metrics and build its snapshot.
    ///
    /// Returns `None` when the repository itself could not be fetched. Failures to
    /// count contributors or commits are logged and count as zero.
    ///
    /// Every metric reflects the repository as of `now`. The commit window ends at
    /// `now` as well, so a redelivered item processed days after `snapshot_date`
    /// still gets a snapshot whose counts agree with each other.
    pub async fn evaluate(&self, repo: &RepoName, snapshot_date: NaiveDate, now: DateTime<Utc>) -> Option<Snapshot> {
        let path = repo.api_path();
        let meta: Repository = match self.client.fetch_as(&path, &[]).await {
            ApiResult::Success(meta) => meta,
            ApiResult::SoftFailure(failure) => {
                log::warn!(target: LOG_TARGET, "Skipping '{repo}': {failure}");
                return None;
            }
        };

        let contributors = self
            .count_or_zero(repo, "contributors", &format!("{path}/contributors"), &[("anon", "true".to_owned())])
            .await;

        let since = now - TimeDelta::days(i64::from(self.settings.commit_window_days));
        let recent_commits = self
            .count_or_zero(
                repo,
                "commits",
                &format!("{path}/commits"),
                &[("since", since.to_rfc3339_opts(SecondsFormat::Secs, true))],
            )
            .await;

        let metrics = HealthMetrics {
            stars: meta.stargazers_count,
            forks: meta.forks_count,
            watchers: meta.watchers_count,
            open_issues: meta.open_issues_count,
            contributors,
            recent_commits,
        };

        let license = meta.license_id().map(str::to_owned);
        Some(Snapshot {
            repo: repo.clone(),
            language: meta.language,
            stars: metrics.stars,
            forks: metrics.forks,
            watchers: metrics.watchers,
            open_issues: metrics.open_issues,
            license,
            contributors,
            recent_commits,
            recent_commits_window_days: self.settings.commit_window_days,
            health_score: health_score(&metrics),
            snapshot_date,
            html_url: meta.html_url,
        })
    }

    async fn count_or_zero(&self, repo: &RepoName, what: &str, endpoint: &str, query: &[(&str, String)]) -> u64 {
        match self.client.count_items(endpoint, query).await {
            ApiResult::Success(count) => count,
            ApiResult::SoftFailure(failure) => {
                log::warn!(target: LOG_TARGET, "Could not count {what} of '{repo}', using 0: {failure}");
                0
            }
        }
    }

    /// Write a snapshot to its daily key, replacing any earlier write for the same day.
    pub async fn store_snapshot(&self, snapshot: &Snapshot) -> Result<String> {
        let key = snapshot_key(&self.settings.daily_prefix, snapshot.snapshot_date, &snapshot.repo);
        self.store.put(&key, snapshot.to_json_bytes()?).await?;
        Ok(key)
    }

    /// Evaluate one work item and store its snapshot.
    pub async fn process(&self, item: &WorkItem, now: DateTime<Utc>) -> Result<ProcessOutcome> {
        let Some(snapshot) = self.evaluate(&item.repo, item.snapshot_date, now).await else {
            return Ok(ProcessOutcome::Skipped);
        };

        let key = self.store_snapshot(&snapshot).await?;
        log::info!(
            target: LOG_TARGET,
            "Stored snapshot of '{}' (score {:.1}) at '{key}'",
            item.repo,
            snapshot.health_score
        );
        Ok(ProcessOutcome::Stored { key })
    }

    /// Process queue message bodies one at a time.
    ///
    /// Every message gets an outcome; no single failure stops the batch.
    pub async fn process_batch<S: AsRef<str>>(&self, bodies: &[S], now: DateTime<Utc>) -> BatchReport {
        let mut report = BatchReport {
            outcomes: Vec::with_capacity(bodies.len()),
        };

        for (index, body) in bodies.iter().enumerate() {
            if index > 0 && !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }

            report.outcomes.push(self.process_body(body.as_ref(), now).await);
        }

        log::info!(
            target: LOG_TARGET,
            "Batch done: {} stored, {} skipped, {} malformed, {} failed",
            report.stored(),
            report.skipped(),
            report.malformed(),
            report.failed()
        );

        report
    }

    async fn process_body(&self, body: &str, now: DateTime<Utc>) -> ItemOutcome {
        let item = match WorkItem::from_body(body, now.date_naive()) {
            Ok(item) => item,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Dropping malformed message {body:?}: {e}");
                return ItemOutcome::Malformed;
            }
        };

        match self.process(&item, now).await {
            Ok(ProcessOutcome::Stored { key }) => ItemOutcome::Stored { key },
            Ok(ProcessOutcome::Skipped) => ItemOutcome::Skipped,
            Err(e) => {
                log::error!(target: LOG_TARGET, "Could not store snapshot of '{}': {e}", item.repo);
                ItemOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport {
            outcomes: vec![
                ItemOutcome::Stored { key: "k".to_string() },
                ItemOutcome::Skipped,
                ItemOutcome::Malformed,
                ItemOutcome::Failed,
                ItemOutcome::Stored { key: "j".to_string() },
            ],
        };

        assert_eq!(report.stored(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.malformed(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_only_failures_stay_queued() {
        assert!(ItemOutcome::Skipped.is_settled());
        assert!(ItemOutcome::Malformed.is_settled());
        assert!(ItemOutcome::Stored { key: String::new() }.is_settled());
        assert!(!ItemOutcome::Failed.is_settled());
    }

    #[test]
    fn test_default_settings() {
        let settings = WorkerSettings::default();
        assert_eq!(settings.daily_prefix, "health/");
        assert_eq!(settings.commit_window_days, 7);
        assert_eq!(settings.item_delay, Duration::from_millis(300));
    }
}
