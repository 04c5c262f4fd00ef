// Transaction port for per-queue atomic operations

use crate::domain::{EntryId, Queue, QueueEntry, QueueHistory, QueueId, TicketNumber, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction (dropping without commit also rolls back)
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Store that can open a unit of work
#[async_trait]
pub trait TransactionalQueueStore: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn QueueTransaction>>;
}

/// Operations inside a unit of work.
///
/// `lock_queue` must be the first call: it takes the storage write lock on the
/// queue row so that ticket allocation and capacity checks that follow cannot
/// interleave with another writer.
#[async_trait]
pub trait QueueTransaction: Transaction {
    /// Lock and load the queue row (None if it does not exist)
    async fn lock_queue(&mut self, queue_id: &QueueId, now_millis: i64) -> Result<Option<Queue>>;

    /// Persist mutable queue columns (occupancy, status, counters, descriptive fields)
    async fn save_queue(&mut self, queue: &Queue) -> Result<()>;

    /// Highest ticket ever issued in the queue
    async fn max_ticket_number(&mut self, queue_id: &QueueId) -> Result<Option<TicketNumber>>;

    /// Insert a new entry
    async fn insert_entry(&mut self, entry: &QueueEntry) -> Result<()>;

    /// Find entry by ID
    async fn find_entry(&mut self, id: &EntryId) -> Result<Option<QueueEntry>>;

    /// The user's waiting or called entry in a queue
    async fn find_live_for_user(
        &mut self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>>;

    /// First waiting entry in service order
    async fn next_waiting(&mut self, queue_id: &QueueId) -> Result<Option<QueueEntry>>;

    /// Waiting entries strictly ahead of `entry` in service order
    async fn count_waiting_ahead(&mut self, entry: &QueueEntry) -> Result<i64>;

    /// Persist mutable entry columns (status, timestamps, priority, notes, estimate)
    async fn save_entry(&mut self, entry: &QueueEntry) -> Result<()>;

    /// Delete waiting/called entries of a queue (reset). Returns rows deleted.
    async fn delete_live_entries(&mut self, queue_id: &QueueId) -> Result<u64>;

    /// Append a history record
    async fn insert_history(&mut self, record: &QueueHistory) -> Result<()>;
}
