// Entry lifecycle: the status state machine applied inside a unit of work

use crate::application::capacity::CapacityTracker;
use crate::application::config::EngineConfig;
use crate::application::history_archiver::HistoryArchiver;
use crate::application::position::PositionEstimator;
use crate::application::ticket_allocator::TicketAllocator;
use crate::application::unit_of_work::UnitOfWork;
use crate::domain::{DomainError, EntryUpdate, Priority, QueueEntry, QueueHistory, UserId};
use crate::error::Result;
use crate::port::IdProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Drives entries through
/// `waiting -> called -> served`, with `cancelled` and `no_show` exits.
///
/// Every method runs inside the entry's queue unit of work; the caller commits.
pub struct EntryLifecycle {
    config: EngineConfig,
    ids: Arc<dyn IdProvider>,
}

impl EntryLifecycle {
    pub fn new(config: EngineConfig, ids: Arc<dyn IdProvider>) -> Self {
        Self { config, ids }
    }

    /// Create a waiting entry in the locked queue
    pub async fn create(
        &self,
        uow: &mut UnitOfWork,
        user_id: &UserId,
        priority: Priority,
        notes: Option<String>,
    ) -> Result<QueueEntry> {
        if user_id.trim().is_empty() {
            return Err(DomainError::InvalidInput("user id cannot be empty".to_string()).into());
        }
        self.config.validate_priority(priority)?;

        if !uow.queue.is_accepting() {
            warn!(queue_id = %uow.queue.id, status = %uow.queue.status, "Join rejected");
            return Err(DomainError::InvalidInput(format!(
                "Queue {} is {} and not accepting entries",
                uow.queue.id, uow.queue.status
            ))
            .into());
        }

        let queue_id = uow.queue.id.clone();
        if uow.tx().find_live_for_user(&queue_id, user_id).await?.is_some() {
            warn!(queue_id = %queue_id, user_id = %user_id, "User already in queue");
            return Err(DomainError::InvalidInput(format!(
                "User {} is already in queue {}",
                user_id, queue_id
            ))
            .into());
        }

        if CapacityTracker::is_full(&uow.queue) {
            warn!(
                queue_id = %queue_id,
                max_capacity = uow.queue.max_capacity,
                "Join rejected, queue full"
            );
            return Err(DomainError::CapacityExceeded {
                queue_id,
                max_capacity: uow.queue.max_capacity,
            }
            .into());
        }

        let ticket_number = TicketAllocator::allocate(uow).await?;
        let mut entry = QueueEntry::new(
            self.ids.generate_id(),
            queue_id,
            user_id.clone(),
            ticket_number,
            priority,
            uow.now,
        );
        entry.notes = notes;

        let rank = PositionEstimator::rank_within(uow, &entry).await?;
        entry.estimated_wait_time = Some(PositionEstimator::estimate_wait(
            rank,
            uow.queue.avg_service_time,
        ));

        uow.tx().insert_entry(&entry).await?;
        CapacityTracker::increment(uow).await?;

        info!(
            entry_id = %entry.id,
            queue_id = %entry.queue_id,
            user_id = %entry.user_id,
            ticket_number = entry.ticket_number,
            priority = entry.priority,
            "Entry created"
        );
        Ok(entry)
    }

    /// Move the first waiting entry (service order) to called. None if nobody waits.
    pub async fn call_next(&self, uow: &mut UnitOfWork) -> Result<Option<QueueEntry>> {
        let queue_id = uow.queue.id.clone();
        let mut entry = match uow.tx().next_waiting(&queue_id).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        entry.call(uow.now)?;
        uow.tx().save_entry(&entry).await?;

        info!(
            entry_id = %entry.id,
            queue_id = %entry.queue_id,
            ticket_number = entry.ticket_number,
            "Entry called"
        );
        Ok(Some(entry))
    }

    /// waiting|called -> cancelled, releasing the slot
    pub async fn cancel(&self, uow: &mut UnitOfWork, mut entry: QueueEntry) -> Result<QueueEntry> {
        let outcome = entry.cancel(uow.now);
        self.reject_logged(&entry, outcome)?;
        uow.tx().save_entry(&entry).await?;
        CapacityTracker::decrement(uow).await?;

        info!(entry_id = %entry.id, queue_id = %entry.queue_id, "Entry cancelled");
        Ok(entry)
    }

    /// called -> served, archiving the history fact and releasing the slot
    pub async fn mark_served(
        &self,
        uow: &mut UnitOfWork,
        mut entry: QueueEntry,
    ) -> Result<(QueueEntry, QueueHistory)> {
        let outcome = entry.serve(uow.now);
        self.reject_logged(&entry, outcome)?;
        uow.tx().save_entry(&entry).await?;
        let record = HistoryArchiver::archive(uow, &entry).await?;
        CapacityTracker::decrement(uow).await?;

        info!(entry_id = %entry.id, queue_id = %entry.queue_id, "Entry served");
        Ok((entry, record))
    }

    /// called -> no_show, releasing the slot
    pub async fn mark_no_show(
        &self,
        uow: &mut UnitOfWork,
        mut entry: QueueEntry,
    ) -> Result<QueueEntry> {
        let outcome = entry.mark_no_show();
        self.reject_logged(&entry, outcome)?;
        uow.tx().save_entry(&entry).await?;
        CapacityTracker::decrement(uow).await?;

        info!(entry_id = %entry.id, queue_id = %entry.queue_id, "Entry marked no-show");
        Ok(entry)
    }

    /// Typed edit of a waiting entry
    pub async fn update(
        &self,
        uow: &mut UnitOfWork,
        mut entry: QueueEntry,
        update: &EntryUpdate,
    ) -> Result<QueueEntry> {
        if let Some(priority) = update.priority {
            self.config.validate_priority(priority)?;
        }
        let outcome = entry.apply(update);
        self.reject_logged(&entry, outcome)?;
        uow.tx().save_entry(&entry).await?;

        info!(entry_id = %entry.id, priority = entry.priority, "Entry updated");
        Ok(entry)
    }

    fn reject_logged(
        &self,
        entry: &QueueEntry,
        outcome: std::result::Result<(), DomainError>,
    ) -> Result<()> {
        if let Err(e) = outcome {
            warn!(entry_id = %entry.id, status = %entry.status, error = %e, "Transition rejected");
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::locks::QueueLocks;
    use crate::domain::{EntryStatus, Queue, QueueDraft, QueueStatus, MILLIS_PER_MINUTE};
    use crate::port::mocks::{InMemoryQueueStore, ManualClock, SequentialIdProvider};
    use crate::port::QueueRepository;
    use crate::ErrorKind;

    struct Fixture {
        store: InMemoryQueueStore,
        locks: QueueLocks,
        clock: ManualClock,
        lifecycle: EntryLifecycle,
    }

    impl Fixture {
        async fn new(max_capacity: i32) -> Self {
            let store = InMemoryQueueStore::new();
            let queue = Queue::new(
                "q1",
                0,
                QueueDraft {
                    business_id: "biz".to_string(),
                    name: "Desk".to_string(),
                    max_capacity: Some(max_capacity),
                    avg_service_time: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
            store.insert_queue(&queue).await.unwrap();

            Self {
                store,
                locks: QueueLocks::new(),
                clock: ManualClock::new(0),
                lifecycle: EntryLifecycle::new(
                    EngineConfig::default(),
                    Arc::new(SequentialIdProvider::new("entry")),
                ),
            }
        }

        async fn uow(&self) -> UnitOfWork {
            UnitOfWork::begin(&self.locks, &self.store, &self.clock, &"q1".to_string())
                .await
                .unwrap()
        }

        async fn join(&self, user: &str, priority: Priority) -> Result<QueueEntry> {
            let mut uow = self.uow().await;
            let entry = self
                .lifecycle
                .create(&mut uow, &user.to_string(), priority, None)
                .await?;
            uow.commit().await?;
            Ok(entry)
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ticket_estimate_and_slot() {
        let fx = Fixture::new(5).await;
        let first = fx.join("u1", 0).await.unwrap();
        fx.clock.advance(1_000);
        let second = fx.join("u2", 0).await.unwrap();

        assert_eq!(first.id, "entry-1");
        assert_eq!(first.ticket_number, 1);
        assert_eq!(second.ticket_number, 2);
        assert_eq!(first.status, EntryStatus::Waiting);
        assert_eq!(first.estimated_wait_time, Some(5));
        assert_eq!(second.estimated_wait_time, Some(10));
        assert_eq!(second.joined_at, 1_000);

        let queue = fx.store.find_queue(&"q1".to_string()).await.unwrap().unwrap();
        assert_eq!(queue.current_capacity, 2);
    }

    #[tokio::test]
    async fn test_create_rejections() {
        let fx = Fixture::new(1).await;
        fx.join("u1", 0).await.unwrap();

        let dup = fx.join("u1", 0).await.unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::InvalidInput);

        let full = fx.join("u2", 0).await.unwrap_err();
        assert_eq!(full.kind(), ErrorKind::CapacityExceeded);

        let empty = fx.join("  ", 0).await.unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::InvalidInput);

        let out_of_range = fx.join("u3", 500).await.unwrap_err();
        assert_eq!(out_of_range.kind(), ErrorKind::InvalidInput);

        // Failed joins leave nothing behind
        let state = fx.store.snapshot().await;
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.queues["q1"].current_capacity, 1);
    }

    #[tokio::test]
    async fn test_paused_queue_rejects_joins() {
        let fx = Fixture::new(5).await;
        fx.store
            .bulk_update_status(&["q1".to_string()], QueueStatus::Paused, 1)
            .await
            .unwrap();

        let err = fx.join("u1", 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("paused"));
    }

    #[tokio::test]
    async fn test_call_next_follows_service_order() {
        let fx = Fixture::new(5).await;
        fx.join("u1", 0).await.unwrap();
        fx.clock.advance(10);
        fx.join("u2", 5).await.unwrap();
        fx.clock.advance(10);
        fx.join("u3", 0).await.unwrap();

        let mut called = Vec::new();
        loop {
            let mut uow = fx.uow().await;
            let next = fx.lifecycle.call_next(&mut uow).await.unwrap();
            uow.commit().await.unwrap();
            match next {
                Some(entry) => called.push(entry.user_id),
                None => break,
            }
        }
        assert_eq!(called, vec!["u2", "u1", "u3"]);
    }

    #[tokio::test]
    async fn test_serve_archives_and_releases() {
        let fx = Fixture::new(2).await;
        let entry = fx.join("u1", 0).await.unwrap();

        fx.clock.set(3 * MILLIS_PER_MINUTE);
        let mut uow = fx.uow().await;
        fx.lifecycle.call_next(&mut uow).await.unwrap();
        uow.commit().await.unwrap();

        fx.clock.set(5 * MILLIS_PER_MINUTE);
        let mut uow = fx.uow().await;
        let loaded = uow.load_entry(&entry.id).await.unwrap();
        let (served, record) = fx.lifecycle.mark_served(&mut uow, loaded).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(served.status, EntryStatus::Served);
        assert_eq!(record.wait_time, 3);
        assert_eq!(record.service_time, 2);

        let state = fx.store.snapshot().await;
        assert_eq!(state.queues["q1"].current_capacity, 0);
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_state() {
        let fx = Fixture::new(2).await;
        let entry = fx.join("u1", 0).await.unwrap();

        let mut uow = fx.uow().await;
        let loaded = uow.load_entry(&entry.id).await.unwrap();
        let err = fx
            .lifecycle
            .mark_no_show(&mut uow, loaded)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        drop(uow);

        let state = fx.store.snapshot().await;
        assert_eq!(state.entries[&entry.id].status, EntryStatus::Waiting);
        assert_eq!(state.queues["q1"].current_capacity, 1);
    }

    #[tokio::test]
    async fn test_cancel_and_update() {
        let fx = Fixture::new(2).await;
        let entry = fx.join("u1", 0).await.unwrap();

        let mut uow = fx.uow().await;
        let loaded = uow.load_entry(&entry.id).await.unwrap();
        let update = EntryUpdate {
            priority: Some(7),
            notes: Some("stroller".to_string()),
        };
        let updated = fx.lifecycle.update(&mut uow, loaded, &update).await.unwrap();
        assert_eq!(updated.priority, 7);

        let cancelled = fx.lifecycle.cancel(&mut uow, updated).await.unwrap();
        assert_eq!(cancelled.status, EntryStatus::Cancelled);
        uow.commit().await.unwrap();

        let state = fx.store.snapshot().await;
        assert_eq!(state.queues["q1"].current_capacity, 0);
        assert!(state.history.is_empty());
    }
}
