//! Durable work queue
//!
//! Discovery produces one message per repository and workers consume them. The
//! [`WorkQueue`] contract is at-least-once: a received message stays in the queue
//! until it is acknowledged, so a worker that dies mid-batch causes redelivery.
//! Ordering is not guaranteed and duplicates are possible; consumers must be
//! idempotent.

use crate::Result;
use async_trait::async_trait;

mod memory;
mod spool;

pub use memory::MemoryQueue;
pub use spool::SpoolQueue;

/// A message handed to a consumer, along with the handle used to acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: String,
    pub body: String,
}

#[async_trait]
pub trait WorkQueue: Send + Sync + core::fmt::Debug {
    /// Enqueue one message.
    async fn send(&self, body: String) -> Result<()>;

    /// Fetch up to `max` pending messages without removing them.
    async fn receive(&self, max: usize) -> Result<Vec<Delivery>>;

    /// Remove a delivered message. Acknowledging twice is not an error.
    async fn ack(&self, delivery: &Delivery) -> Result<()>;
}
