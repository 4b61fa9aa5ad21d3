//! Health worker
//!
//! Consumes work items, fetches each repository's metrics, scores them, and writes
//! one snapshot per repository per day. Snapshot keys depend only on the date and
//! the repository, so redelivered messages overwrite rather than duplicate.

mod health_worker;
mod repo_name;
mod snapshot;
mod work_item;

pub use health_worker::{BatchReport, HealthWorker, ItemOutcome, ProcessOutcome, WorkerSettings};
pub use repo_name::RepoName;
pub use snapshot::{HealthMetrics, Snapshot, health_score, raw_day_prefix, snapshot_key};
pub use work_item::WorkItem;
