use super::RepoName;
use crate::Result;
use chrono::NaiveDate;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};

/// A queued request to evaluate one repository for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub repo: RepoName,
    pub snapshot_date: NaiveDate,
}

/// Accepted message shape.
///
/// Older producers send `repo_full_name` along with extra search fields and no date.
#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(alias = "repo_full_name")]
    repo: RepoName,

    #[serde(default)]
    snapshot_date: Option<NaiveDate>,
}

impl WorkItem {
    #[must_use]
    pub const fn new(repo: RepoName, snapshot_date: NaiveDate) -> Self {
        Self { repo, snapshot_date }
    }

    /// Decode a queue message body.
    ///
    /// A message without a date is stamped with `processing_day`.
    pub fn from_body(body: &str, processing_day: NaiveDate) -> Result<Self> {
        let wire: WireItem = serde_json::from_str(body).into_app_err("malformed work item")?;
        Ok(Self {
            repo: wire.repo,
            snapshot_date: wire.snapshot_date.unwrap_or(processing_day),
        })
    }

    /// Encode as a queue message body.
    pub fn to_body(&self) -> Result<String> {
        serde_json::to_string(self).into_app_err("encoding work item")
    }
}
