// Entry Repository Port (Interface)

use crate::domain::{EntryId, EntryStatus, QueueEntry, QueueId, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only access to queue entries (no lock, may observe a stale snapshot)
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Find entry by ID
    async fn find_entry(&self, id: &EntryId) -> Result<Option<QueueEntry>>;

    /// The user's waiting entry in a queue, if any
    async fn find_waiting_for_user(
        &self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>>;

    /// Waiting entries strictly ahead of `entry` in service order
    async fn count_waiting_ahead(&self, entry: &QueueEntry) -> Result<i64>;

    /// Count entries by status
    async fn count_by_status(&self, queue_id: &QueueId, status: EntryStatus) -> Result<i64>;

    /// Entries of a queue in service order, optionally filtered by status
    async fn find_by_queue(
        &self,
        queue_id: &QueueId,
        status: Option<EntryStatus>,
    ) -> Result<Vec<QueueEntry>>;

    /// A user's live (waiting/called) entries across queues, newest first
    async fn find_live_for_user(&self, user_id: &UserId) -> Result<Vec<QueueEntry>>;
}
