// Position and wait estimation

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::{estimate_wait, Position, QueueEntry, QueueId, UserId};
use crate::error::{AppError, Result};
use crate::port::{EntryRepository, QueueRepository};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Ranks waiting entries under the service order
/// (priority DESC, joined_at ASC, ticket_number ASC)
pub struct PositionEstimator {
    queues: Arc<dyn QueueRepository>,
    entries: Arc<dyn EntryRepository>,
}

impl PositionEstimator {
    pub fn new(queues: Arc<dyn QueueRepository>, entries: Arc<dyn EntryRepository>) -> Self {
        Self { queues, entries }
    }

    /// The ordering contract used by call-next and every rank computation
    pub fn order(a: &QueueEntry, b: &QueueEntry) -> Ordering {
        QueueEntry::service_order(a, b)
    }

    /// rank * avg_service_time
    pub fn estimate_wait(rank: i64, avg_service_time: i32) -> i64 {
        estimate_wait(rank, avg_service_time)
    }

    /// 1-based rank of the user's waiting entry; rank 0 when not waiting.
    ///
    /// Lock-free read: may observe a slightly stale snapshot.
    pub async fn get_position(&self, queue_id: &QueueId, user_id: &UserId) -> Result<Position> {
        let queue = self
            .queues
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| AppError::queue_not_found(queue_id))?;

        let entry = match self.entries.find_waiting_for_user(queue_id, user_id).await? {
            Some(entry) => entry,
            None => return Ok(Position::not_waiting()),
        };

        let rank = self.entries.count_waiting_ahead(&entry).await? + 1;
        let position = Position {
            rank,
            estimated_wait_minutes: Self::estimate_wait(rank, queue.avg_service_time),
        };

        debug!(
            queue_id = %queue_id,
            user_id = %user_id,
            rank = position.rank,
            "Position computed"
        );
        Ok(position)
    }

    /// Rank of `entry` as seen inside a unit of work (entry need not be stored yet)
    pub async fn rank_within(uow: &mut UnitOfWork, entry: &QueueEntry) -> Result<i64> {
        Ok(uow.tx().count_waiting_ahead(entry).await? + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::locks::QueueLocks;
    use crate::domain::{EntryStatus, Queue, QueueDraft};
    use crate::port::mocks::{InMemoryQueueStore, ManualClock};
    use crate::port::TransactionalQueueStore;
    use crate::ErrorKind;

    async fn seeded() -> Arc<InMemoryQueueStore> {
        let store = Arc::new(InMemoryQueueStore::new());
        let queue = Queue::new(
            "q1",
            0,
            QueueDraft {
                business_id: "biz".to_string(),
                name: "Desk".to_string(),
                avg_service_time: Some(4),
                ..Default::default()
            },
        )
        .unwrap();
        store.insert_queue(&queue).await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert_entry(&QueueEntry::new("e1", "q1", "u1", 1, 0, 100))
            .await
            .unwrap();
        tx.insert_entry(&QueueEntry::new("e2", "q1", "u2", 2, 5, 200))
            .await
            .unwrap();
        tx.insert_entry(&QueueEntry::new("e3", "q1", "u3", 3, 0, 300))
            .await
            .unwrap();
        let mut called = QueueEntry::new("e4", "q1", "u4", 4, 50, 50);
        called.call(400).unwrap();
        tx.insert_entry(&called).await.unwrap();
        tx.commit().await.unwrap();
        store
    }

    fn estimator(store: &Arc<InMemoryQueueStore>) -> PositionEstimator {
        PositionEstimator::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_priority_then_fifo_ranks() {
        let store = seeded().await;
        let positions = estimator(&store);
        let q1 = "q1".to_string();

        let u2 = positions.get_position(&q1, &"u2".to_string()).await.unwrap();
        let u1 = positions.get_position(&q1, &"u1".to_string()).await.unwrap();
        let u3 = positions.get_position(&q1, &"u3".to_string()).await.unwrap();

        assert_eq!((u2.rank, u1.rank, u3.rank), (1, 2, 3));
        assert_eq!(u3.estimated_wait_minutes, 12);
    }

    #[tokio::test]
    async fn test_called_entries_do_not_count() {
        let store = seeded().await;
        let positions = estimator(&store);

        // u4 is called, so it has no waiting position and does not push others back
        let u4 = positions
            .get_position(&"q1".to_string(), &"u4".to_string())
            .await
            .unwrap();
        assert_eq!(u4, Position::not_waiting());

        let waiting = store
            .snapshot()
            .await
            .entries
            .values()
            .filter(|e| e.status == EntryStatus::Waiting)
            .count();
        assert_eq!(waiting, 3);
    }

    #[tokio::test]
    async fn test_unknown_queue_is_not_found() {
        let store = seeded().await;
        let err = estimator(&store)
            .get_position(&"nope".to_string(), &"u1".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rank_within_for_unsaved_entry() {
        let store = seeded().await;
        let locks = QueueLocks::new();
        let clock = ManualClock::new(500);
        let mut uow = UnitOfWork::begin(&locks, store.as_ref(), &clock, &"q1".to_string())
            .await
            .unwrap();

        let newcomer = QueueEntry::new("e5", "q1", "u5", 5, 0, 500);
        assert_eq!(PositionEstimator::rank_within(&mut uow, &newcomer).await.unwrap(), 4);

        let vip = QueueEntry::new("e6", "q1", "u6", 6, 9, 500);
        assert_eq!(PositionEstimator::rank_within(&mut uow, &vip).await.unwrap(), 1);
    }
}
