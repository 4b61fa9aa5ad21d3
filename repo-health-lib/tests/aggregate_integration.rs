//! Integration tests for weekly aggregation over a filesystem store

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use repo_health_lib::aggregate::{AggregateOutcome, WeeklyAggregator};
use repo_health_lib::storage::{FsObjectStore, ObjectStore};
use repo_health_lib::worker::{RepoName, Snapshot, snapshot_key};
use serde_json::Value;

fn day(s: &str) -> NaiveDate {
    s.parse().expect("valid date")
}

fn temp_store() -> (tempfile::TempDir, FsObjectStore) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf-8 path");
    (temp_dir, FsObjectStore::new(root))
}

fn snapshot(repo: &str, date: NaiveDate, stars: u64) -> Snapshot {
    Snapshot {
        repo: RepoName::parse(repo).expect("valid repo"),
        language: Some("Python".to_string()),
        stars,
        forks: 1,
        watchers: 2,
        open_issues: 3,
        license: None,
        contributors: 4,
        recent_commits: 5,
        recent_commits_window_days: 7,
        health_score: 42.0,
        snapshot_date: date,
        html_url: None,
    }
}

async fn put_snapshot(store: &FsObjectStore, snapshot: &Snapshot) {
    let key = snapshot_key("health/", snapshot.snapshot_date, &snapshot.repo);
    store
        .put(&key, snapshot.to_json_bytes().expect("serializable"))
        .await
        .expect("put succeeds");
}

#[tokio::test]
async fn test_aggregates_three_of_seven_days() {
    let (_temp_dir, store) = temp_store();

    put_snapshot(&store, &snapshot("old/outside", day("2024-04-30"), 1)).await;
    put_snapshot(&store, &snapshot("b/first", day("2024-05-01"), 10)).await;
    put_snapshot(&store, &snapshot("a/first", day("2024-05-01"), 11)).await;
    put_snapshot(&store, &snapshot("c/third", day("2024-05-03"), 30)).await;
    put_snapshot(&store, &snapshot("d/seventh", day("2024-05-07"), 70)).await;

    let aggregator = WeeklyAggregator::new(&store, "health/", "health/weekly/");
    let outcome = aggregator.aggregate(day("2024-05-07")).await.expect("aggregation succeeds");

    assert_eq!(
        outcome,
        AggregateOutcome::Written {
            week: "2024-W19".to_string(),
            records: 4,
            json_key: "health/weekly/2024-W19/summary.json".to_string(),
            csv_key: "health/weekly/2024-W19/summary.csv".to_string(),
        }
    );

    let json: Value = serde_json::from_slice(&store.get("health/weekly/2024-W19/summary.json").await.expect("json written"))
        .expect("valid json");
    let repos: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["repo"].as_str().expect("repo string"))
        .collect();
    assert_eq!(repos, vec!["a/first", "b/first", "c/third", "d/seventh"]);

    let csv = String::from_utf8(store.get("health/weekly/2024-W19/summary.csv").await.expect("csv written")).expect("utf-8");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(
            "repo,language,stars,forks,watchers,open_issues,license,contributors,recent_commits,\
             recent_commits_window_days,health_score,snapshot_date,html_url"
        )
    );
    assert_eq!(lines.next(), Some("a/first,Python,11,1,2,3,,4,5,7,42.0,2024-05-01,"));
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn test_rerun_produces_identical_summaries() {
    let (_temp_dir, store) = temp_store();
    put_snapshot(&store, &snapshot("a/one", day("2024-05-02"), 10)).await;
    put_snapshot(&store, &snapshot("b/two", day("2024-05-05"), 20)).await;

    let aggregator = WeeklyAggregator::new(&store, "health/", "health/weekly/");

    let first = aggregator.aggregate(day("2024-05-07")).await.expect("first run");
    let json_first = store.get("health/weekly/2024-W19/summary.json").await.expect("json");
    let csv_first = store.get("health/weekly/2024-W19/summary.csv").await.expect("csv");

    let second = aggregator.aggregate(day("2024-05-07")).await.expect("second run");
    let json_second = store.get("health/weekly/2024-W19/summary.json").await.expect("json");
    let csv_second = store.get("health/weekly/2024-W19/summary.csv").await.expect("csv");

    assert_eq!(first, second);
    assert_eq!(json_first, json_second);
    assert_eq!(csv_first, csv_second);
}

#[tokio::test]
async fn test_empty_week_writes_nothing() {
    let (_temp_dir, store) = temp_store();
    put_snapshot(&store, &snapshot("old/one", day("2024-04-20"), 1)).await;

    let aggregator = WeeklyAggregator::new(&store, "health/", "health/weekly/");
    let outcome = aggregator.aggregate(day("2024-05-07")).await.expect("aggregation succeeds");

    assert_eq!(outcome, AggregateOutcome::NoData);
    assert!(store.list("health/weekly/").await.expect("list works").is_empty());
}

#[tokio::test]
async fn test_heterogeneous_records_use_union_of_columns() {
    let (_temp_dir, store) = temp_store();

    store
        .put(
            "health/2024-05-06/raw/legacy_repo.json",
            br#"{"repo":"legacy/repo","stars":5,"health_score":7.5}"#.to_vec(),
        )
        .await
        .expect("put succeeds");
    store
        .put(
            "health/2024-05-07/raw/newer_repo.json",
            br#"{"repo":"newer/repo","stars":6,"contributors":2,"health_score":12}"#.to_vec(),
        )
        .await
        .expect("put succeeds");
    store
        .put("health/2024-05-07/raw/broken.json", b"{ not json".to_vec())
        .await
        .expect("put succeeds");

    let aggregator = WeeklyAggregator::new(&store, "health/", "health/weekly/");
    let outcome = aggregator.aggregate(day("2024-05-07")).await.expect("aggregation succeeds");
    assert!(matches!(outcome, AggregateOutcome::Written { records: 2, .. }));

    let csv = String::from_utf8(store.get("health/weekly/2024-W19/summary.csv").await.expect("csv written")).expect("utf-8");
    assert_eq!(
        csv,
        "repo,stars,health_score,contributors\n\
         legacy/repo,5,7.5,\n\
         newer/repo,6,12,2\n"
    );
}
