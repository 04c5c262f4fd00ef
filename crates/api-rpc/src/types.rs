//! RPC Request/Response Types
//!
//! Parameters are named (JSON objects). Entities are returned as their
//! core serde representation.

use ezyq_core::domain::{BusinessId, EntryId, Queue, QueueEntry, QueueId, QueueStatus, QueueUpdate, UserId};
use serde::{Deserialize, Serialize};

/// queue.join.v1
pub use ezyq_core::application::JoinRequest;
/// queue.create.v1
pub use ezyq_core::domain::QueueDraft as CreateQueueRequest;

/// queue.get.v1, queue.reset.v1, queue.call_next.v1, queue.stats.v1
#[derive(Debug, Deserialize)]
pub struct QueueRequest {
    pub queue_id: QueueId,
}

/// queue.update.v1
#[derive(Debug, Deserialize)]
pub struct UpdateQueueRequest {
    pub queue_id: QueueId,
    #[serde(flatten)]
    pub update: QueueUpdate,
}

/// queue.status.v1
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub queue_id: QueueId,
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub queue: Queue,
    pub removed_entries: u64,
}

/// queue.position.v1
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub queue_id: QueueId,
    pub user_id: UserId,
}

/// queue.call_next.v1 (entry is null when nobody is waiting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallNextResponse {
    pub entry: Option<QueueEntry>,
}

/// entry.cancel.v1, entry.complete.v1, entry.no_show.v1
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub entry_id: EntryId,
}

/// business.stats.v1
#[derive(Debug, Deserialize)]
pub struct BusinessStatsRequest {
    pub business_id: BusinessId,
}
