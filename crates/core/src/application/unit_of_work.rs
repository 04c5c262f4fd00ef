// Unit of work: queue lock + storage transaction

use crate::application::locks::QueueLocks;
use crate::domain::{EntryId, Queue, QueueEntry, QueueId};
use crate::error::{AppError, Result};
use crate::port::{QueueTransaction, TimeProvider, TransactionalQueueStore};
use tokio::sync::OwnedMutexGuard;

/// One per-queue critical section.
///
/// Field order matters: the transaction is dropped (rolled back) before the
/// queue guard is released.
pub struct UnitOfWork {
    tx: Box<dyn QueueTransaction>,
    _guard: OwnedMutexGuard<()>,

    /// Locked queue row; components mutate it and persist with `save_queue`
    pub queue: Queue,

    /// Clock reading taken after the lock was acquired
    pub now: i64,
}

impl UnitOfWork {
    /// Lock the queue in-process, open a transaction and lock its row
    ///
    /// Fails with NotFound if the queue does not exist.
    pub async fn begin(
        locks: &QueueLocks,
        store: &dyn TransactionalQueueStore,
        clock: &dyn TimeProvider,
        queue_id: &QueueId,
    ) -> Result<Self> {
        let guard = locks.acquire(queue_id).await;
        let now = clock.now_millis();

        let mut tx = store.begin_transaction().await?;
        let queue = match tx.lock_queue(queue_id, now).await? {
            Some(queue) => queue,
            None => {
                // Unknown ids must not leave a slot behind
                drop(tx);
                drop(guard);
                locks.discard_idle(queue_id);
                return Err(AppError::queue_not_found(queue_id));
            }
        };

        Ok(Self {
            tx,
            _guard: guard,
            queue,
            now,
        })
    }

    pub fn tx(&mut self) -> &mut dyn QueueTransaction {
        self.tx.as_mut()
    }

    /// Persist the in-memory queue row
    pub async fn save_queue(&mut self) -> Result<()> {
        self.tx.save_queue(&self.queue).await
    }

    /// Re-read an entry under the lock; it must belong to the locked queue
    pub async fn load_entry(&mut self, entry_id: &EntryId) -> Result<QueueEntry> {
        match self.tx.find_entry(entry_id).await? {
            Some(entry) if entry.queue_id == self.queue.id => Ok(entry),
            _ => Err(AppError::entry_not_found(entry_id)),
        }
    }

    pub async fn commit(self) -> Result<()> {
        let UnitOfWork { tx, _guard, .. } = self;
        tx.commit().await
    }

    pub async fn rollback(self) -> Result<()> {
        let UnitOfWork { tx, _guard, .. } = self;
        tx.rollback().await
    }
}
