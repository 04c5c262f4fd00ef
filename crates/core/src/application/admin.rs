// Business-side queue management

use crate::application::locks::QueueLocks;
use crate::application::unit_of_work::UnitOfWork;
use crate::domain::{BusinessId, Queue, QueueDraft, QueueId, QueueStatus, QueueUpdate};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, Repositories, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Create, edit, pause/close, reset and delete queues
pub struct QueueAdmin {
    repos: Repositories,
    locks: Arc<QueueLocks>,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
}

impl QueueAdmin {
    pub fn new(
        repos: Repositories,
        locks: Arc<QueueLocks>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            repos,
            locks,
            ids,
            clock,
        }
    }

    async fn begin(&self, queue_id: &QueueId) -> Result<UnitOfWork> {
        UnitOfWork::begin(
            &self.locks,
            self.repos.store.as_ref(),
            self.clock.as_ref(),
            queue_id,
        )
        .await
    }

    pub async fn create_queue(&self, draft: QueueDraft) -> Result<Queue> {
        let queue = Queue::new(self.ids.generate_id(), self.clock.now_millis(), draft)?;
        self.repos.queues.insert_queue(&queue).await?;

        info!(
            queue_id = %queue.id,
            business_id = %queue.business_id,
            max_capacity = queue.max_capacity,
            "Queue created"
        );
        Ok(queue)
    }

    pub async fn get_queue(&self, queue_id: &QueueId) -> Result<Queue> {
        self.repos
            .queues
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| AppError::queue_not_found(queue_id))
    }

    /// Typed update; lowering max_capacity below occupancy is rejected
    pub async fn update_queue(&self, queue_id: &QueueId, update: &QueueUpdate) -> Result<Queue> {
        let mut uow = self.begin(queue_id).await?;
        let now = uow.now;
        uow.queue.apply(update, now)?;
        uow.save_queue().await?;
        let queue = uow.queue.clone();
        uow.commit().await?;

        info!(queue_id = %queue_id, "Queue updated");
        Ok(queue)
    }

    pub async fn set_status(&self, queue_id: &QueueId, status: QueueStatus) -> Result<Queue> {
        let mut uow = self.begin(queue_id).await?;
        uow.queue.status = status;
        uow.queue.updated_at = uow.now;
        uow.save_queue().await?;
        let queue = uow.queue.clone();
        uow.commit().await?;

        info!(queue_id = %queue_id, status = %status, "Queue status changed");
        Ok(queue)
    }

    /// Single statement over many queues. Returns the number of queues changed.
    pub async fn bulk_set_status(&self, queue_ids: &[QueueId], status: QueueStatus) -> Result<u64> {
        let changed = self
            .repos
            .queues
            .bulk_update_status(queue_ids, status, self.clock.now_millis())
            .await?;

        info!(requested = queue_ids.len(), changed, status = %status, "Bulk status change");
        Ok(changed)
    }

    /// Drop live entries and zero occupancy and the display counter.
    /// History is untouched. Returns the reset queue and entries removed.
    pub async fn reset_queue(&self, queue_id: &QueueId) -> Result<(Queue, u64)> {
        let mut uow = self.begin(queue_id).await?;
        let removed = uow.tx().delete_live_entries(queue_id).await?;
        let now = uow.now;
        uow.queue.reset(now);
        uow.save_queue().await?;
        let queue = uow.queue.clone();
        uow.commit().await?;

        warn!(queue_id = %queue_id, removed, "Queue reset");
        Ok((queue, removed))
    }

    /// Increment the display counter; returns the new number
    pub async fn advance_display_number(&self, queue_id: &QueueId) -> Result<i64> {
        let mut uow = self.begin(queue_id).await?;
        let now = uow.now;
        let number = uow.queue.advance_display_number(now);
        uow.save_queue().await?;
        uow.commit().await?;

        info!(queue_id = %queue_id, current_number = number, "Display number advanced");
        Ok(number)
    }

    /// Administrative delete, cascading to entries
    pub async fn delete_queue(&self, queue_id: &QueueId) -> Result<bool> {
        let guard = self.locks.acquire(queue_id).await;
        let deleted = self.repos.queues.delete_queue(queue_id).await?;
        drop(guard);
        self.locks.discard_idle(queue_id);

        if deleted {
            warn!(queue_id = %queue_id, "Queue deleted");
        }
        Ok(deleted)
    }

    pub async fn list_business_queues(&self, business_id: &BusinessId) -> Result<Vec<Queue>> {
        self.repos.queues.find_by_business(business_id).await
    }

    pub async fn list_active_queues(&self, limit: i64) -> Result<Vec<Queue>> {
        self.repos.queues.find_active(limit).await
    }

    pub async fn list_queues_by_category(&self, category: &str, limit: i64) -> Result<Vec<Queue>> {
        self.repos.queues.find_by_category(category, limit).await
    }

    /// Free-text lookup over queue names and descriptions
    pub async fn search_queues(
        &self,
        query: &str,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Queue>> {
        let query = query.trim();
        let queues = self.repos.queues.search(query, category, limit).await?;

        debug!(query, category, found = queues.len(), "Queue search");
        Ok(queues)
    }
}
