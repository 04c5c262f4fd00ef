// Queue Domain Model

use crate::domain::entry::TicketNumber;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Queue identifier
pub type QueueId = String;

/// Owning business (a user with the business role)
pub type BusinessId = String;

/// Default max capacity for new queues
pub const DEFAULT_MAX_CAPACITY: i32 = 50;

/// Default average service time per customer (minutes)
pub const DEFAULT_AVG_SERVICE_TIME: i32 = 10;

/// Queue Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Active,
    Paused,
    Closed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Active => "active",
            QueueStatus::Paused => "paused",
            QueueStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueueStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(QueueStatus::Active),
            "paused" => Ok(QueueStatus::Paused),
            "closed" => Ok(QueueStatus::Closed),
            other => Err(DomainError::InvalidInput(format!(
                "Unknown queue status: {}",
                other
            ))),
        }
    }
}

/// Queue Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub business_id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,

    pub max_capacity: i32,
    pub current_capacity: i32,
    pub avg_service_time: i32, // minutes
    pub status: QueueStatus,

    /// Display counter shown on the business screen, independent of tickets
    pub current_number: i64,

    /// Highest ticket ever issued; survives purges and resets
    #[serde(default)]
    pub last_ticket_number: TicketNumber,

    pub created_at: i64, // epoch ms
    pub updated_at: i64,
}

/// Fields a business supplies when opening a queue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueDraft {
    pub business_id: BusinessId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub max_capacity: Option<i32>,
    #[serde(default)]
    pub avg_service_time: Option<i32>,
}

/// Mutable queue fields. `None` leaves the field unchanged.
///
/// Occupancy, counters and status are deliberately absent: they only change
/// through the engine and the explicit status operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub max_capacity: Option<i32>,
    #[serde(default)]
    pub avg_service_time: Option<i32>,
}

impl Queue {
    /// Create a queue from a validated draft
    ///
    /// # Arguments
    ///
    /// * `id` - Unique queue ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `draft` - Business supplied fields
    pub fn new(id: impl Into<String>, created_at: i64, draft: QueueDraft) -> Result<Self> {
        validate_name(&draft.business_id, "business id")?;
        validate_name(&draft.name, "queue name")?;

        let max_capacity = draft.max_capacity.unwrap_or(DEFAULT_MAX_CAPACITY);
        let avg_service_time = draft.avg_service_time.unwrap_or(DEFAULT_AVG_SERVICE_TIME);
        validate_max_capacity(max_capacity)?;
        validate_service_time(avg_service_time)?;

        Ok(Self {
            id: id.into(),
            business_id: draft.business_id,
            name: draft.name.trim().to_string(),
            description: draft.description,
            category: draft.category,
            location: draft.location,
            max_capacity,
            current_capacity: 0,
            avg_service_time,
            status: QueueStatus::Active,
            current_number: 0,
            last_ticket_number: 0,
            created_at,
            updated_at: created_at,
        })
    }

    /// Only active queues accept new entries
    pub fn is_accepting(&self) -> bool {
        self.status == QueueStatus::Active
    }

    pub fn is_full(&self) -> bool {
        self.current_capacity >= self.max_capacity
    }

    /// Take one slot. Rejects instead of clamping when already at max.
    pub fn occupy(&mut self) -> Result<()> {
        if self.is_full() {
            return Err(DomainError::CapacityExceeded {
                queue_id: self.id.clone(),
                max_capacity: self.max_capacity,
            });
        }
        self.current_capacity += 1;
        Ok(())
    }

    /// Release one slot, floored at 0
    pub fn release(&mut self) {
        self.current_capacity = (self.current_capacity - 1).max(0);
    }

    /// round(current / max * 100); 0 for a zero-capacity queue
    pub fn utilization_percent(&self) -> u32 {
        if self.max_capacity <= 0 {
            return 0;
        }
        let ratio = self.current_capacity as f64 / self.max_capacity as f64;
        (ratio * 100.0).round().max(0.0) as u32
    }

    /// Apply a typed update
    pub fn apply(&mut self, update: &QueueUpdate, now_millis: i64) -> Result<()> {
        if let Some(max_capacity) = update.max_capacity {
            validate_max_capacity(max_capacity)?;
            if max_capacity < self.current_capacity {
                return Err(DomainError::InvalidInput(format!(
                    "max_capacity {} is below current occupancy {}",
                    max_capacity, self.current_capacity
                )));
            }
        }
        if let Some(avg_service_time) = update.avg_service_time {
            validate_service_time(avg_service_time)?;
        }
        if let Some(name) = &update.name {
            validate_name(name, "queue name")?;
        }

        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(category) = &update.category {
            self.category = Some(category.clone());
        }
        if let Some(location) = &update.location {
            self.location = Some(location.clone());
        }
        if let Some(max_capacity) = update.max_capacity {
            self.max_capacity = max_capacity;
        }
        if let Some(avg_service_time) = update.avg_service_time {
            self.avg_service_time = avg_service_time;
        }
        self.updated_at = now_millis;
        Ok(())
    }

    /// Bump the display counter shown on the business screen
    pub fn advance_display_number(&mut self, now_millis: i64) -> i64 {
        self.current_number += 1;
        self.updated_at = now_millis;
        self.current_number
    }

    /// Next ticket above both the recorded high-water mark and `stored_max`
    pub fn issue_ticket(&mut self, stored_max: Option<TicketNumber>) -> TicketNumber {
        let latest = self.last_ticket_number.max(stored_max.unwrap_or(0));
        self.last_ticket_number = latest + 1;
        self.last_ticket_number
    }

    /// Clear occupancy and the display counter (entries are removed by the caller)
    pub fn reset(&mut self, now_millis: i64) {
        self.current_capacity = 0;
        self.current_number = 0;
        self.updated_at = now_millis;
    }
}

fn validate_name(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(())
}

fn validate_max_capacity(max_capacity: i32) -> Result<()> {
    if max_capacity < 1 {
        return Err(DomainError::InvalidInput(format!(
            "max_capacity must be at least 1, got {}",
            max_capacity
        )));
    }
    Ok(())
}

fn validate_service_time(minutes: i32) -> Result<()> {
    if minutes < 0 {
        return Err(DomainError::InvalidInput(format!(
            "avg_service_time cannot be negative, got {}",
            minutes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(max_capacity: i32) -> QueueDraft {
        QueueDraft {
            business_id: "biz-1".to_string(),
            name: "Bakery".to_string(),
            max_capacity: Some(max_capacity),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_queue_defaults() {
        let queue = Queue::new(
            "q1",
            1000,
            QueueDraft {
                business_id: "biz-1".to_string(),
                name: "  Pharmacy ".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(queue.name, "Pharmacy");
        assert_eq!(queue.max_capacity, DEFAULT_MAX_CAPACITY);
        assert_eq!(queue.avg_service_time, DEFAULT_AVG_SERVICE_TIME);
        assert_eq!(queue.current_capacity, 0);
        assert_eq!(queue.current_number, 0);
        assert_eq!(queue.status, QueueStatus::Active);
        assert_eq!(queue.updated_at, 1000);
    }

    #[test]
    fn test_new_queue_rejects_empty_name() {
        let mut d = draft(5);
        d.name = "   ".to_string();
        assert!(matches!(
            Queue::new("q1", 0, d),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_occupy_rejects_when_full() {
        let mut queue = Queue::new("q1", 0, draft(2)).unwrap();
        queue.occupy().unwrap();
        queue.occupy().unwrap();
        assert!(queue.is_full());

        let err = queue.occupy().unwrap_err();
        assert_eq!(
            err,
            DomainError::CapacityExceeded {
                queue_id: "q1".to_string(),
                max_capacity: 2
            }
        );
        assert_eq!(queue.current_capacity, 2);
    }

    #[test]
    fn test_release_floors_at_zero() {
        let mut queue = Queue::new("q1", 0, draft(2)).unwrap();
        queue.release();
        assert_eq!(queue.current_capacity, 0);
    }

    #[test]
    fn test_utilization_rounds() {
        let mut queue = Queue::new("q1", 0, draft(3)).unwrap();
        assert_eq!(queue.utilization_percent(), 0);
        queue.occupy().unwrap();
        assert_eq!(queue.utilization_percent(), 33);
        queue.occupy().unwrap();
        assert_eq!(queue.utilization_percent(), 67);

        queue.max_capacity = 0;
        assert_eq!(queue.utilization_percent(), 0);
    }

    #[test]
    fn test_update_cannot_shrink_below_occupancy() {
        let mut queue = Queue::new("q1", 0, draft(3)).unwrap();
        queue.occupy().unwrap();
        queue.occupy().unwrap();

        let update = QueueUpdate {
            max_capacity: Some(1),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(queue.apply(&update, 50).is_err());
        // Nothing applied on failure
        assert_eq!(queue.name, "Bakery");
        assert_eq!(queue.max_capacity, 3);

        let update = QueueUpdate {
            max_capacity: Some(2),
            avg_service_time: Some(4),
            ..Default::default()
        };
        queue.apply(&update, 60).unwrap();
        assert_eq!(queue.max_capacity, 2);
        assert_eq!(queue.avg_service_time, 4);
        assert_eq!(queue.updated_at, 60);
    }

    #[test]
    fn test_display_number_and_reset() {
        let mut queue = Queue::new("q1", 0, draft(3)).unwrap();
        queue.occupy().unwrap();
        assert_eq!(queue.advance_display_number(5), 1);
        assert_eq!(queue.advance_display_number(6), 2);

        queue.reset(9);
        assert_eq!(queue.current_number, 0);
        assert_eq!(queue.current_capacity, 0);
        assert_eq!(queue.updated_at, 9);
    }

    #[test]
    fn test_issue_ticket_never_goes_back() {
        let mut queue = Queue::new("q1", 0, draft(3)).unwrap();
        assert_eq!(queue.issue_ticket(None), 1);
        assert_eq!(queue.issue_ticket(Some(1)), 2);

        // Stored rows were purged: the mark still wins
        assert_eq!(queue.issue_ticket(None), 3);

        // Rows above the mark (legacy data) push it forward
        assert_eq!(queue.issue_ticket(Some(9)), 10);

        queue.reset(5);
        assert_eq!(queue.issue_ticket(None), 11);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [QueueStatus::Active, QueueStatus::Paused, QueueStatus::Closed] {
            assert_eq!(status.as_str().parse::<QueueStatus>().unwrap(), status);
        }
        assert!("open".parse::<QueueStatus>().is_err());
    }
}
