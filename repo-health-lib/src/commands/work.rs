use super::Host;
use super::common::{CommonArgs, Setting};
use crate::Result;
use crate::queue::WorkQueue;
use crate::worker::HealthWorker;
use chrono::Utc;
use clap::Parser;
use std::io::Write;

const LOG_TARGET: &str = "    worker";

#[derive(Parser, Debug)]
pub struct WorkArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Stop after this many batches (default is to drain the queue)
    #[arg(long, value_name = "COUNT")]
    pub max_batches: Option<u32>,
}

/// Totals over every batch of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WorkTotals {
    batches: u32,
    stored: usize,
    skipped: usize,
    malformed: usize,
    failed: usize,
}

pub async fn process_queue<H: Host>(host: &mut H, args: &WorkArgs) -> Result<()> {
    let config = args.common.init()?;
    args.common
        .require(&[Setting::Bucket, Setting::QueueUrl, Setting::GithubToken])?;

    let store = args.common.open_store()?;
    let queue = args.common.open_queue()?;
    let client = args.common.api_client(&config)?;
    let worker = HealthWorker::new(&client, &store, config.worker_settings());

    let totals = drain(&worker, &queue, config.batch_size, args.max_batches).await?;

    let _ = writeln!(
        host.output(),
        "Processed {} batch(es): {} stored, {} skipped, {} malformed, {} failed",
        totals.batches,
        totals.stored,
        totals.skipped,
        totals.malformed,
        totals.failed
    );

    Ok(())
}

/// Receive and process batches until the queue is empty or `max_batches` is reached.
///
/// Messages are acknowledged once settled. A batch in which nothing could be settled
/// ends the run so that failing messages are not spun on; they stay queued.
async fn drain(worker: &HealthWorker<'_>, queue: &dyn WorkQueue, batch_size: usize, max_batches: Option<u32>) -> Result<WorkTotals> {
    let mut totals = WorkTotals::default();

    while max_batches.is_none_or(|max| totals.batches < max) {
        let deliveries = queue.receive(batch_size).await?;
        if deliveries.is_empty() {
            break;
        }

        let bodies: Vec<&str> = deliveries.iter().map(|d| d.body.as_str()).collect();
        let report = worker.process_batch(&bodies, Utc::now()).await;
        totals.batches += 1;

        let mut settled = 0;
        for (delivery, outcome) in deliveries.iter().zip(&report.outcomes) {
            if outcome.is_settled() {
                queue.ack(delivery).await?;
                settled += 1;
            }
        }

        totals.stored += report.stored();
        totals.skipped += report.skipped();
        totals.malformed += report.malformed();
        totals.failed += report.failed();

        if settled == 0 {
            log::warn!(
                target: LOG_TARGET,
                "No message in the batch could be settled, leaving {} for redelivery",
                deliveries.len()
            );
            break;
        }
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::test_support::empty_args;
    use crate::commands::host::TestHost;
    use crate::hosting::{Client, ClientSettings};
    use crate::queue::MemoryQueue;
    use crate::storage::MemoryObjectStore;
    use crate::worker::WorkerSettings;
    use core::time::Duration;

    #[tokio::test]
    async fn test_requires_all_settings() {
        let mut host = TestHost::new();
        let args = WorkArgs {
            common: empty_args(),
            max_batches: None,
        };

        let err = process_queue(&mut host, &args).await.unwrap_err().to_string();
        assert!(err.contains("BUCKET_NAME"), "{err}");
        assert!(err.contains("QUEUE_URL"), "{err}");
        assert!(err.contains("GITHUB_TOKEN"), "{err}");
    }

    #[tokio::test]
    async fn test_drain_acks_malformed_messages() {
        let client = Client::new(None, "http://127.0.0.1:9", ClientSettings::default()).unwrap();
        let store = MemoryObjectStore::new();
        let settings = WorkerSettings {
            item_delay: Duration::ZERO,
            ..WorkerSettings::default()
        };
        let worker = HealthWorker::new(&client, &store, settings);

        let queue = MemoryQueue::new();
        queue.send("garbage".to_string()).await.unwrap();
        queue.send("{}".to_string()).await.unwrap();
        queue.send("[1]".to_string()).await.unwrap();

        let totals = drain(&worker, &queue, 2, None).await.unwrap();
        assert_eq!(totals.batches, 2);
        assert_eq!(totals.malformed, 3);
        assert!(queue.is_empty().await);
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_drain_respects_max_batches() {
        let client = Client::new(None, "http://127.0.0.1:9", ClientSettings::default()).unwrap();
        let store = MemoryObjectStore::new();
        let worker = HealthWorker::new(&client, &store, WorkerSettings::default());

        let queue = MemoryQueue::new();
        for _ in 0..5 {
            queue.send("bad".to_string()).await.unwrap();
        }

        let totals = drain(&worker, &queue, 1, Some(2)).await.unwrap();
        assert_eq!(totals.batches, 2);
        assert_eq!(queue.len().await, 3);
    }
}
