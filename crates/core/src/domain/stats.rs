// Read models: position and aggregate statistics

use crate::domain::queue::{BusinessId, Queue, QueueId};
use serde::{Deserialize, Serialize};

/// Estimated wait = rank * avg_service_time (linear, recomputed per query)
pub fn estimate_wait(rank: i64, avg_service_time: i32) -> i64 {
    rank * avg_service_time as i64
}

/// A user's place in a queue. rank 0 = no waiting entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub rank: i64,
    pub estimated_wait_minutes: i64,
}

impl Position {
    pub fn not_waiting() -> Self {
        Self {
            rank: 0,
            estimated_wait_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    pub queue_id: QueueId,
    pub waiting_count: i64,
    pub avg_wait_minutes: i64,
    pub total_served: i64,
    pub utilization_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessStats {
    pub business_id: BusinessId,
    pub total_queues: i64,
    pub active_queues: i64,
    /// Distinct users served across all of the business's queues
    pub total_customers: i64,
    pub total_served: i64,
}

/// Active queue ranked by recent joins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularQueue {
    pub queue: Queue,
    pub entry_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_wait_is_linear() {
        assert_eq!(estimate_wait(0, 10), 0);
        assert_eq!(estimate_wait(1, 10), 10);
        assert_eq!(estimate_wait(7, 3), 21);
        assert_eq!(estimate_wait(4, 0), 0);
    }
}
