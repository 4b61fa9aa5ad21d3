//! Integration tests for repository discovery, fan-out, and export

use async_trait::async_trait;
use camino::Utf8PathBuf;
use chrono::NaiveDate;
use core::sync::atomic::{AtomicUsize, Ordering};
use core::time::Duration;
use ohno::bail;
use repo_health_lib::discovery::{DiscoveryEnd, DiscoveryFilter, discover, export_rows, fan_out, write_export};
use repo_health_lib::hosting::{Client, ClientSettings, SoftFailure};
use repo_health_lib::queue::{Delivery, MemoryQueue, WorkQueue};
use repo_health_lib::storage::{FsObjectStore, ObjectStore};
use repo_health_lib::worker::{RepoName, WorkItem};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Client {
    let settings = ClientSettings {
        request_timeout: Duration::from_secs(5),
        rate_limit_backoff: Duration::ZERO,
        max_rate_limit_retries: 1,
    };
    Client::new(Some("token"), server.uri(), settings).expect("client should build")
}

fn filter(language: &str, max_repos: usize, page_size: u32) -> DiscoveryFilter {
    DiscoveryFilter {
        language: language.to_string(),
        min_stars: 100,
        max_repos,
        page_size,
    }
}

fn item(full_name: &str, stars: u64) -> Value {
    json!({
        "full_name": full_name,
        "language": "Python",
        "stargazers_count": stars,
        "license": { "spdx_id": "MIT", "name": "MIT License" }
    })
}

fn page(items: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "total_count": 1000,
        "incomplete_results": false,
        "items": items
    }))
}

async fn mount_page(server: &MockServer, language: &str, number: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", format!("language:{language} stars:>=100")))
        .and(query_param("sort", "stars"))
        .and(query_param("order", "desc"))
        .and(query_param("page", number.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

fn names(discovery: &repo_health_lib::discovery::Discovery) -> Vec<String> {
    discovery.repos.iter().map(|r| r.full_name.to_string()).collect()
}

#[tokio::test]
async fn test_discover_stops_at_max_repos_and_drops_low_stars() {
    let server = MockServer::start().await;
    mount_page(&server, "Python", 1, page(vec![item("a/one", 500), item("b/two", 400)])).await;
    mount_page(&server, "Python", 2, page(vec![item("c/three", 300), item("d/four", 50)])).await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "3"))
        .respond_with(page(vec![item("e/five", 250), item("f/six", 200)]))
        .expect(0)
        .mount(&server)
        .await;

    let discovery = discover(&client(&server), &filter("Python", 3, 2)).await;

    assert_eq!(names(&discovery), vec!["a/one", "b/two", "c/three"]);
    assert_eq!(discovery.end, DiscoveryEnd::LimitReached);
    assert!(discovery.repos.iter().all(|r| r.stars >= 100));
}

#[tokio::test]
async fn test_discover_truncates_to_max_repos() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "Python",
        1,
        page(vec![item("a/one", 500), item("b/two", 400), item("c/three", 300)]),
    )
    .await;

    let discovery = discover(&client(&server), &filter("Python", 2, 3)).await;
    assert_eq!(names(&discovery), vec!["a/one", "b/two"]);
    assert_eq!(discovery.end, DiscoveryEnd::LimitReached);
}

#[tokio::test]
async fn test_discover_stops_on_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, "Python", 1, page(vec![item("a/one", 500), item("b/two", 400)])).await;
    mount_page(&server, "Python", 2, page(vec![item("c/three", 300)])).await;

    let discovery = discover(&client(&server), &filter("Python", 100, 2)).await;
    assert_eq!(names(&discovery), vec!["a/one", "b/two", "c/three"]);
    assert_eq!(discovery.end, DiscoveryEnd::Exhausted);
}

#[tokio::test]
async fn test_discover_stops_on_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, "Python", 1, page(vec![])).await;

    let discovery = discover(&client(&server), &filter("Python", 100, 2)).await;
    assert!(discovery.repos.is_empty());
    assert_eq!(discovery.end, DiscoveryEnd::Exhausted);
}

#[tokio::test]
async fn test_discover_pages_past_incomplete_short_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "Python",
        1,
        ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 50,
            "incomplete_results": true,
            "items": [item("a/one", 900), item("b/two", 800), item("c/three", 700)]
        })),
    )
    .await;
    mount_page(
        &server,
        "Python",
        2,
        page(vec![
            item("d/four", 600),
            item("e/five", 500),
            item("f/six", 400),
            item("g/seven", 300),
            item("h/eight", 200),
        ]),
    )
    .await;

    let discovery = discover(&client(&server), &filter("Python", 8, 5)).await;
    assert_eq!(discovery.repos.len(), 8);
    assert_eq!(discovery.end, DiscoveryEnd::LimitReached);
}

#[tokio::test]
async fn test_discover_zero_page_size_terminates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("per_page", "1"))
        .respond_with(page(vec![]))
        .expect(1)
        .mount(&server)
        .await;

    let discovery = discover(&client(&server), &filter("Python", 100, 0)).await;
    assert!(discovery.repos.is_empty());
    assert_eq!(discovery.end, DiscoveryEnd::Exhausted);
}

#[tokio::test]
async fn test_discover_keeps_partial_results_on_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "Python", 1, page(vec![item("a/one", 500), item("b/two", 400)])).await;
    mount_page(&server, "Python", 2, ResponseTemplate::new(500)).await;

    let discovery = discover(&client(&server), &filter("Python", 100, 2)).await;
    assert_eq!(names(&discovery), vec!["a/one", "b/two"]);
    assert_eq!(discovery.end, DiscoveryEnd::SoftFailure(SoftFailure::Status(500)));
}

#[tokio::test]
async fn test_discover_rate_limited_first_page_is_empty_not_error() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "Python",
        1,
        ResponseTemplate::new(403).set_body_string("API rate limit exceeded for 10.0.0.1"),
    )
    .await;

    let discovery = discover(&client(&server), &filter("Python", 100, 2)).await;
    assert!(discovery.repos.is_empty());
    assert_eq!(
        discovery.end,
        DiscoveryEnd::SoftFailure(SoftFailure::RateLimited { attempts: 2 })
    );
}

/// Queue that refuses every `fail_every`-th message.
#[derive(Debug)]
struct FlakyQueue {
    inner: MemoryQueue,
    fail_every: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl WorkQueue for FlakyQueue {
    async fn send(&self, body: String) -> repo_health_lib::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if call % self.fail_every == 0 {
            bail!("queue unavailable");
        }
        self.inner.send(body).await
    }

    async fn receive(&self, max: usize) -> repo_health_lib::Result<Vec<Delivery>> {
        self.inner.receive(max).await
    }

    async fn ack(&self, delivery: &Delivery) -> repo_health_lib::Result<()> {
        self.inner.ack(delivery).await
    }
}

#[tokio::test]
async fn test_fan_out_continues_past_failures() {
    let queue = FlakyQueue {
        inner: MemoryQueue::new(),
        fail_every: 2,
        calls: AtomicUsize::new(0),
    };

    let day = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    let items: Vec<WorkItem> = ["a/one", "b/two", "c/three"]
        .iter()
        .map(|name| WorkItem::new(RepoName::parse(name).expect("valid name"), day))
        .collect();

    let report = fan_out(&queue, &items).await;
    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 1);

    let bodies = queue.inner.bodies().await;
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].contains("a/one"));
    assert!(bodies[1].contains("c/three"));
}

#[tokio::test]
async fn test_export_writes_csv_per_language() {
    let server = MockServer::start().await;
    mount_page(&server, "Python", 1, page(vec![item("pallets/flask", 500)])).await;
    mount_page(
        &server,
        "Rust",
        1,
        page(vec![json!({
            "full_name": "serde-rs/serde",
            "language": "Rust",
            "stargazers_count": 9000,
            "license": null
        })]),
    )
    .await;

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let store = FsObjectStore::new(Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf-8 path"));

    let day = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    let rows = export_rows(&client(&server), &[filter("Python", 10, 100), filter("Rust", 10, 100)], day).await;
    let key = write_export(&store, &rows, day).await.expect("export should be written");

    assert_eq!(key, "discovered_repos_20240501.csv");
    let text = String::from_utf8(store.get(&key).await.expect("export exists")).expect("utf-8");
    assert_eq!(
        text,
        "repo,language,stars,license,snapshot_date\n\
         pallets/flask,Python,500,MIT,2024-05-01\n\
         serde-rs/serde,Rust,9000,,2024-05-01\n"
    );
}
