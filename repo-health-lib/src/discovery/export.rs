use super::{DiscoveryFilter, discover};
use crate::Result;
use crate::hosting::Client;
use crate::reports::generate_csv_rows;
use crate::storage::ObjectStore;
use crate::worker::RepoName;
use chrono::NaiveDate;
use serde::Serialize;

const LOG_TARGET: &str = " discovery";
const EXPORT_HEADER: [&str; 5] = ["repo", "language", "stars", "license", "snapshot_date"];

/// One line of the discovery export table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub repo: RepoName,

    /// The language that was searched for
    pub language: String,
    pub stars: u64,
    pub license: Option<String>,
    pub snapshot_date: NaiveDate,
}

/// Storage key of the export table for a day: `discovered_repos_<YYYYMMDD>.csv`.
#[must_use]
pub fn export_key(snapshot_date: NaiveDate) -> String {
    format!("discovered_repos_{}.csv", snapshot_date.format("%Y%m%d"))
}

/// Run discovery for every filter and flatten the results.
pub async fn export_rows(client: &Client, filters: &[DiscoveryFilter], snapshot_date: NaiveDate) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for filter in filters {
        let discovery = discover(client, filter).await;
        rows.extend(discovery.repos.into_iter().map(|repo| ExportRow {
            repo: repo.full_name,
            language: filter.language.clone(),
            stars: repo.stars,
            license: repo.license,
            snapshot_date,
        }));
    }
    rows
}

/// Write the export table and return its key.
pub async fn write_export(store: &dyn ObjectStore, rows: &[ExportRow], snapshot_date: NaiveDate) -> Result<String> {
    let key = export_key(snapshot_date);
    let bytes = generate_csv_rows(&EXPORT_HEADER, rows)?;
    store.put(&key, bytes).await?;

    log::info!(target: LOG_TARGET, "Exported {} repositories to '{key}'", rows.len());
    Ok(key)
}
