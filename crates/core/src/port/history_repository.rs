// History Repository Port (Interface)

use crate::domain::{BusinessId, QueueHistory, QueueId, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to the append-only history (writes happen inside `QueueTransaction`)
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Mean wait_time of records completed after `since_millis` (None if no records)
    async fn average_wait_since(&self, queue_id: &QueueId, since_millis: i64)
        -> Result<Option<f64>>;

    /// Total records for a queue
    async fn count_for_queue(&self, queue_id: &QueueId) -> Result<i64>;

    /// (total served, distinct customers) across a business's queues
    async fn served_for_business(&self, business_id: &BusinessId) -> Result<(i64, i64)>;

    /// Records of a queue, most recent first
    async fn history_for_queue(&self, queue_id: &QueueId, limit: i64) -> Result<Vec<QueueHistory>>;

    /// A user's records across queues, most recent first
    async fn history_for_user(&self, user_id: &UserId, limit: i64) -> Result<Vec<QueueHistory>>;
}
