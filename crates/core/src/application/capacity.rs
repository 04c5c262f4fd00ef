// Capacity bookkeeping

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::Queue;
use crate::error::Result;
use tracing::{debug, warn};

/// Keeps a queue's occupancy within [0, max_capacity]
pub struct CapacityTracker;

impl CapacityTracker {
    /// Take a slot; CapacityExceeded when the queue is full
    pub async fn increment(uow: &mut UnitOfWork) -> Result<()> {
        if let Err(e) = uow.queue.occupy() {
            warn!(
                queue_id = %uow.queue.id,
                max_capacity = uow.queue.max_capacity,
                "Queue is full"
            );
            return Err(e.into());
        }
        uow.save_queue().await?;

        debug!(
            queue_id = %uow.queue.id,
            current_capacity = uow.queue.current_capacity,
            "Capacity incremented"
        );
        Ok(())
    }

    /// Release a slot (floored at 0)
    pub async fn decrement(uow: &mut UnitOfWork) -> Result<()> {
        uow.queue.release();
        uow.save_queue().await?;

        debug!(
            queue_id = %uow.queue.id,
            current_capacity = uow.queue.current_capacity,
            "Capacity decremented"
        );
        Ok(())
    }

    pub fn is_full(queue: &Queue) -> bool {
        queue.is_full()
    }

    pub fn utilization(queue: &Queue) -> u32 {
        queue.utilization_percent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::locks::QueueLocks;
    use crate::domain::QueueDraft;
    use crate::port::mocks::{InMemoryQueueStore, ManualClock};
    use crate::port::QueueRepository;
    use crate::ErrorKind;

    #[tokio::test]
    async fn test_increment_and_decrement_persist() {
        let store = InMemoryQueueStore::new();
        let queue = Queue::new(
            "q1",
            0,
            QueueDraft {
                business_id: "biz".to_string(),
                name: "Desk".to_string(),
                max_capacity: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        store.insert_queue(&queue).await.unwrap();

        let locks = QueueLocks::new();
        let clock = ManualClock::new(0);
        let q1 = "q1".to_string();

        let mut uow = UnitOfWork::begin(&locks, &store, &clock, &q1).await.unwrap();
        CapacityTracker::increment(&mut uow).await.unwrap();
        assert!(CapacityTracker::is_full(&uow.queue));
        assert_eq!(CapacityTracker::utilization(&uow.queue), 100);

        let err = CapacityTracker::increment(&mut uow).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        uow.commit().await.unwrap();

        let stored = store.find_queue(&q1).await.unwrap().unwrap();
        assert_eq!(stored.current_capacity, 1);

        let mut uow = UnitOfWork::begin(&locks, &store, &clock, &q1).await.unwrap();
        CapacityTracker::decrement(&mut uow).await.unwrap();
        CapacityTracker::decrement(&mut uow).await.unwrap();
        uow.commit().await.unwrap();

        let stored = store.find_queue(&q1).await.unwrap().unwrap();
        assert_eq!(stored.current_capacity, 0);
    }
}
