// Queue Entry Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::queue::QueueId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Entry ID (UUID v4)
pub type EntryId = String;

/// Customer identifier
pub type UserId = String;

/// Per-queue sequential ticket, starting at 1
pub type TicketNumber = i64;

/// Priority (higher number = served sooner)
pub type Priority = i32;

/// Entry Status
///
/// ```text
/// waiting -> called      (call_next)
/// waiting -> cancelled   (cancel)
/// called  -> served      (mark_served)
/// called  -> cancelled   (cancel)
/// called  -> no_show     (mark_no_show)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Waiting,
    Called,
    Served,
    Cancelled,
    NoShow,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Waiting => "waiting",
            EntryStatus::Called => "called",
            EntryStatus::Served => "served",
            EntryStatus::Cancelled => "cancelled",
            EntryStatus::NoShow => "no_show",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EntryStatus::Served | EntryStatus::Cancelled | EntryStatus::NoShow
        )
    }

    /// Waiting or called: the entry still occupies a capacity slot
    pub fn is_live(&self) -> bool {
        matches!(self, EntryStatus::Waiting | EntryStatus::Called)
    }

    pub fn can_transition_to(&self, next: EntryStatus) -> bool {
        matches!(
            (self, next),
            (EntryStatus::Waiting, EntryStatus::Called)
                | (EntryStatus::Waiting, EntryStatus::Cancelled)
                | (EntryStatus::Called, EntryStatus::Served)
                | (EntryStatus::Called, EntryStatus::Cancelled)
                | (EntryStatus::Called, EntryStatus::NoShow)
        )
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiting" => Ok(EntryStatus::Waiting),
            "called" => Ok(EntryStatus::Called),
            "served" => Ok(EntryStatus::Served),
            "cancelled" => Ok(EntryStatus::Cancelled),
            "no_show" => Ok(EntryStatus::NoShow),
            other => Err(DomainError::InvalidInput(format!(
                "Unknown entry status: {}",
                other
            ))),
        }
    }
}

/// Mutable entry fields, only while the entry is waiting. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryUpdate {
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Queue Entry Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub queue_id: QueueId,
    pub user_id: UserId,
    pub ticket_number: TicketNumber,
    pub status: EntryStatus,
    pub priority: Priority,

    pub joined_at: i64, // epoch ms, immutable
    pub called_at: Option<i64>,
    pub served_at: Option<i64>,
    pub cancelled_at: Option<i64>,

    pub estimated_wait_time: Option<i64>, // minutes, at join time
    pub notes: Option<String>,
}

impl QueueEntry {
    /// Create a waiting entry
    ///
    /// # Arguments
    ///
    /// * `id` - Unique entry ID (injected)
    /// * `ticket_number` - Allocated under the queue lock
    /// * `joined_at` - Join timestamp in epoch ms (injected)
    pub fn new(
        id: impl Into<String>,
        queue_id: impl Into<String>,
        user_id: impl Into<String>,
        ticket_number: TicketNumber,
        priority: Priority,
        joined_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            queue_id: queue_id.into(),
            user_id: user_id.into(),
            ticket_number,
            status: EntryStatus::Waiting,
            priority,
            joined_at,
            called_at: None,
            served_at: None,
            cancelled_at: None,
            estimated_wait_time: None,
            notes: None,
        }
    }

    fn transition(&mut self, next: EntryStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// waiting -> called
    pub fn call(&mut self, now_millis: i64) -> Result<()> {
        self.transition(EntryStatus::Called)?;
        self.called_at = Some(now_millis);
        Ok(())
    }

    /// called -> served
    pub fn serve(&mut self, now_millis: i64) -> Result<()> {
        self.transition(EntryStatus::Served)?;
        self.served_at = Some(now_millis);
        Ok(())
    }

    /// waiting|called -> cancelled
    pub fn cancel(&mut self, now_millis: i64) -> Result<()> {
        self.transition(EntryStatus::Cancelled)?;
        self.cancelled_at = Some(now_millis);
        Ok(())
    }

    /// called -> no_show (keeps called_at, sets no other timestamp)
    pub fn mark_no_show(&mut self) -> Result<()> {
        self.transition(EntryStatus::NoShow)
    }

    /// Apply a typed update; only waiting entries can be edited
    pub fn apply(&mut self, update: &EntryUpdate) -> Result<()> {
        if self.status != EntryStatus::Waiting {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: "updated".to_string(),
            });
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
        Ok(())
    }

    /// Service order: priority DESC, joined_at ASC, ticket_number ASC
    pub fn service_order(a: &QueueEntry, b: &QueueEntry) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then(a.joined_at.cmp(&b.joined_at))
            .then(a.ticket_number.cmp(&b.ticket_number))
    }

    /// True if `self` is served strictly before `other`
    pub fn is_ahead_of(&self, other: &QueueEntry) -> bool {
        Self::service_order(self, other) == Ordering::Less
    }
}
