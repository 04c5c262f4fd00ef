// Queue Repository Port (Interface)

use crate::domain::{BusinessId, PopularQueue, Queue, QueueId, QueueStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Queue persistence (reads and lock-free writes)
///
/// Anything that touches occupancy or entries goes through
/// `QueueTransaction` instead.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Insert a new queue
    async fn insert_queue(&self, queue: &Queue) -> Result<()>;

    /// Find queue by ID
    async fn find_queue(&self, id: &QueueId) -> Result<Option<Queue>>;

    /// All queues of a business, newest first
    async fn find_by_business(&self, business_id: &BusinessId) -> Result<Vec<Queue>>;

    /// Active queues, least occupied first
    async fn find_active(&self, limit: i64) -> Result<Vec<Queue>>;

    /// Active queues of one category, least occupied first
    async fn find_by_category(&self, category: &str, limit: i64) -> Result<Vec<Queue>>;

    /// Queues whose name or description contains `query` (ASCII case-insensitive),
    /// optionally restricted to one category. Least occupied first.
    async fn search(&self, query: &str, category: Option<&str>, limit: i64) -> Result<Vec<Queue>>;

    /// Distinct non-null categories, sorted
    async fn categories(&self) -> Result<Vec<String>>;

    /// (total, active) queue counts of a business
    async fn count_for_business(&self, business_id: &BusinessId) -> Result<(i64, i64)>;

    /// Active queues ranked by entries joined since `since_millis`
    async fn find_popular(&self, since_millis: i64, limit: i64) -> Result<Vec<PopularQueue>>;

    /// Administrative delete (cascades to entries). Returns false if absent.
    async fn delete_queue(&self, id: &QueueId) -> Result<bool>;

    /// Set status on many queues at once. Returns rows changed.
    async fn bulk_update_status(
        &self,
        ids: &[QueueId],
        status: QueueStatus,
        now_millis: i64,
    ) -> Result<u64>;
}
