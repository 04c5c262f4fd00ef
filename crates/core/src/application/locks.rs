// Per-queue critical sections

use crate::domain::QueueId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Lock table keyed by queue id
///
/// Every mutating operation on a queue holds that queue's guard for the whole
/// unit of work. Operations on different queues never contend.
#[derive(Default)]
pub struct QueueLocks {
    table: Mutex<HashMap<QueueId, Arc<AsyncMutex<()>>>>,
}

impl QueueLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, queue_id: &QueueId) -> Arc<AsyncMutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table
            .entry(queue_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to a queue
    pub async fn acquire(&self, queue_id: &QueueId) -> OwnedMutexGuard<()> {
        let guard = self.slot(queue_id).lock_owned().await;
        debug!(queue_id = %queue_id, "Queue lock acquired");
        guard
    }

    /// Drop a slot nobody holds or waits on
    ///
    /// Acquirers clone the slot under the table lock, so a count of one
    /// means only the table still references it.
    pub fn discard_idle(&self, queue_id: &QueueId) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table
            .get(queue_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            table.remove(queue_id);
        }
    }

    /// Number of queues with a slot
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
