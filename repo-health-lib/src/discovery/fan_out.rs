use crate::queue::WorkQueue;
use crate::worker::WorkItem;

const LOG_TARGET: &str = " discovery";

/// Counts of a fan-out run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub sent: usize,
    pub failed: usize,
}

/// Enqueue one message per work item.
///
/// A failure to enqueue one item is logged and counted; the remaining items are
/// still sent.
pub async fn fan_out(queue: &dyn WorkQueue, items: &[WorkItem]) -> FanOutReport {
    let mut report = FanOutReport::default();

    for item in items {
        let sent = match item.to_body() {
            Ok(body) => queue.send(body).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(()) => report.sent += 1,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not enqueue '{}': {e}", item.repo);
                report.failed += 1;
            }
        }
    }

    log::info!(target: LOG_TARGET, "Enqueued {} work item(s), {} failed", report.sent, report.failed);
    report
}
