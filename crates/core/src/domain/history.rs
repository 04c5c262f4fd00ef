// Queue History (append-only analytics fact)

use crate::domain::entry::{EntryId, EntryStatus, QueueEntry, TicketNumber, UserId};
use crate::domain::error::{DomainError, Result};
use crate::domain::queue::QueueId;
use serde::{Deserialize, Serialize};

pub const MILLIS_PER_MINUTE: i64 = 60 * 1000;

/// Floor a millisecond duration to whole minutes (clock skew clamps to 0)
pub fn whole_minutes(duration_ms: i64) -> i64 {
    duration_ms.max(0) / MILLIS_PER_MINUTE
}

/// Immutable record of a completed entry. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueHistory {
    pub entry_id: EntryId,
    pub queue_id: QueueId,
    pub user_id: UserId,
    pub ticket_number: TicketNumber,
    pub wait_time: i64,    // minutes
    pub service_time: i64, // minutes
    pub status: EntryStatus,
    pub joined_at: i64,
    pub completed_at: i64,
    pub rating: Option<i32>, // 1..=5
    pub feedback: Option<String>,
}

impl QueueHistory {
    /// Build the fact for an entry that just transitioned to served
    ///
    /// wait = (called_at or now) - joined_at, service = now - called_at (0 if never called)
    pub fn from_served(entry: &QueueEntry, now_millis: i64) -> Result<Self> {
        if entry.status != EntryStatus::Served {
            return Err(DomainError::InvalidTransition {
                from: entry.status.to_string(),
                to: "archived".to_string(),
            });
        }

        let wait_end = entry.called_at.unwrap_or(now_millis);
        let wait_time = whole_minutes(wait_end - entry.joined_at);
        let service_time = entry
            .called_at
            .map(|called_at| whole_minutes(now_millis - called_at))
            .unwrap_or(0);

        Ok(Self {
            entry_id: entry.id.clone(),
            queue_id: entry.queue_id.clone(),
            user_id: entry.user_id.clone(),
            ticket_number: entry.ticket_number,
            wait_time,
            service_time,
            status: EntryStatus::Served,
            joined_at: entry.joined_at,
            completed_at: now_millis,
            rating: None,
            feedback: None,
        })
    }
}
