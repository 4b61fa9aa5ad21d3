use super::RepoName;
use crate::Result;
use crate::storage::sanitize_key_component;
use chrono::NaiveDate;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};

/// Raw counts that feed the health score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthMetrics {
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub contributors: u64,
    pub recent_commits: u64,
}

/// Weighted sum of popularity and activity, floored at zero.
///
/// Open issues count against the score; everything else counts for it, forks and
/// contributors more heavily than stars.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "counts stay far below 2^52")]
pub fn health_score(m: &HealthMetrics) -> f64 {
    let score = m.stars as f64 + 2.0 * m.forks as f64 + 0.5 * m.watchers as f64 - m.open_issues as f64
        + 3.0 * m.contributors as f64
        + m.recent_commits as f64;
    score.max(0.0)
}

/// One repository's metrics on one day.
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub repo: RepoName,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub license: Option<String>,
    pub contributors: u64,
    pub recent_commits: u64,
    pub recent_commits_window_days: u32,
    pub health_score: f64,
    pub snapshot_date: NaiveDate,
    pub html_url: Option<String>,
}

impl Snapshot {
    #[must_use]
    pub const fn metrics(&self) -> HealthMetrics {
        HealthMetrics {
            stars: self.stars,
            forks: self.forks,
            watchers: self.watchers,
            open_issues: self.open_issues,
            contributors: self.contributors,
            recent_commits: self.recent_commits,
        }
    }

    /// Pretty-printed JSON, byte-for-byte stable for equal snapshots.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).into_app_err_with(|| format!("serializing snapshot of '{}'", self.repo))
    }
}

/// Storage key of a repository's snapshot for a day: `<prefix><date>/raw/<owner>_<name>.json`.
#[must_use]
pub fn snapshot_key(daily_prefix: &str, snapshot_date: NaiveDate, repo: &RepoName) -> String {
    format!(
        "{}{}.json",
        raw_day_prefix(daily_prefix, snapshot_date),
        sanitize_key_component(&repo.to_string())
    )
}

/// Prefix under which all snapshots of one day live.
#[must_use]
pub fn raw_day_prefix(daily_prefix: &str, day: NaiveDate) -> String {
    format!("{daily_prefix}{day}/raw/")
}
