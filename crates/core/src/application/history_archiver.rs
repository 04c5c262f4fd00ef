// History archiving

use crate::application::unit_of_work::UnitOfWork;
use crate::domain::{QueueEntry, QueueHistory};
use crate::error::Result;
use tracing::info;

/// Turns a served entry into its immutable history fact
pub struct HistoryArchiver;

impl HistoryArchiver {
    /// Append the history row for an entry that was just served.
    ///
    /// Called exactly once per served transition. A second call for the same
    /// entry fails in storage with ConcurrencyViolation.
    pub async fn archive(uow: &mut UnitOfWork, entry: &QueueEntry) -> Result<QueueHistory> {
        let record = QueueHistory::from_served(entry, uow.now)?;
        uow.tx().insert_history(&record).await?;

        info!(
            entry_id = %record.entry_id,
            queue_id = %record.queue_id,
            wait_time = record.wait_time,
            service_time = record.service_time,
            "Entry archived"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::locks::QueueLocks;
    use crate::domain::{Queue, QueueDraft, MILLIS_PER_MINUTE};
    use crate::port::mocks::{InMemoryQueueStore, ManualClock};
    use crate::port::QueueRepository;
    use crate::ErrorKind;

    #[tokio::test]
    async fn test_archive_once() {
        let store = InMemoryQueueStore::new();
        let queue = Queue::new(
            "q1",
            0,
            QueueDraft {
                business_id: "biz".to_string(),
                name: "Desk".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        store.insert_queue(&queue).await.unwrap();

        let clock = ManualClock::new(10 * MILLIS_PER_MINUTE);
        let locks = QueueLocks::new();
        let mut uow = UnitOfWork::begin(&locks, &store, &clock, &"q1".to_string())
            .await
            .unwrap();

        let mut entry = QueueEntry::new("e1", "q1", "u1", 1, 0, 0);
        entry.call(4 * MILLIS_PER_MINUTE).unwrap();
        entry.serve(uow.now).unwrap();

        let record = HistoryArchiver::archive(&mut uow, &entry).await.unwrap();
        assert_eq!(record.wait_time, 4);
        assert_eq!(record.service_time, 6);

        let err = HistoryArchiver::archive(&mut uow, &entry).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConcurrencyViolation);
        uow.commit().await.unwrap();

        assert_eq!(store.snapshot().await.history.len(), 1);
    }
}
