use super::{Delivery, WorkQueue};
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    pending: BTreeMap<u64, String>,
}

/// Queue that keeps pending messages in memory, in send order.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    inner: Mutex<Inner>,
}

impl MemoryQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages not yet acknowledged.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.pending.is_empty()
    }

    /// Bodies of all pending messages, in send order.
    pub async fn bodies(&self) -> Vec<String> {
        self.inner.lock().await.pending.values().cloned().collect()
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn send(&self, body: String) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;
        let _ = inner.pending.insert(id, body);
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<Delivery>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .pending
            .iter()
            .take(max)
            .map(|(id, body)| Delivery {
                id: id.to_string(),
                body: body.clone(),
            })
            .collect())
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        if let Ok(id) = delivery.id.parse::<u64>() {
            let _ = self.inner.lock().await.pending.remove(&id);
        }
        Ok(())
    }
}
