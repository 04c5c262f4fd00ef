// Queue Service - the engine's public operations

use crate::application::admin::QueueAdmin;
use crate::application::config::EngineConfig;
use crate::application::lifecycle::EntryLifecycle;
use crate::application::locks::QueueLocks;
use crate::application::position::PositionEstimator;
use crate::application::stats::QueueStatsAggregator;
use crate::application::unit_of_work::UnitOfWork;
use crate::domain::{
    BusinessId, BusinessStats, EntryId, EntryStatus, EntryUpdate, PopularQueue, Position, Priority,
    QueueEntry, QueueHistory, QueueId, QueueStats, UserId,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, Repositories, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Join request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub queue_id: QueueId,
    pub user_id: UserId,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub notes: Option<String>,
}

impl JoinRequest {
    pub fn new(queue_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            queue_id: queue_id.into(),
            user_id: user_id.into(),
            priority: 0,
            notes: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Engine facade.
///
/// Mutations run as one unit of work per queue (in-process lock + storage
/// transaction); reads go straight to the repositories.
pub struct QueueService {
    repos: Repositories,
    locks: Arc<QueueLocks>,
    clock: Arc<dyn TimeProvider>,
    lifecycle: EntryLifecycle,
    positions: PositionEstimator,
    stats: QueueStatsAggregator,
    admin: QueueAdmin,
}

impl QueueService {
    pub fn new(
        repos: Repositories,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
        config: EngineConfig,
    ) -> Self {
        let locks = Arc::new(QueueLocks::new());
        Self {
            lifecycle: EntryLifecycle::new(config.clone(), ids.clone()),
            positions: PositionEstimator::new(repos.queues.clone(), repos.entries.clone()),
            stats: QueueStatsAggregator::new(repos.clone(), clock.clone(), config),
            admin: QueueAdmin::new(repos.clone(), locks.clone(), ids, clock.clone()),
            repos,
            locks,
            clock,
        }
    }

    /// Queue management operations (shares this service's lock table)
    pub fn admin(&self) -> &QueueAdmin {
        &self.admin
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

    /// Resolve the entry's queue, lock it, then re-read the entry under the lock
    async fn begin_for_entry(&self, entry_id: &EntryId) -> Result<(UnitOfWork, QueueEntry)> {
        let entry = self.get_entry(entry_id).await?;
        let mut uow = self.begin(&entry.queue_id).await?;
        let entry = uow.load_entry(entry_id).await?;
        Ok((uow, entry))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn join_queue(&self, req: JoinRequest) -> Result<QueueEntry> {
        let mut uow = self.begin(&req.queue_id).await?;
        let entry = self
            .lifecycle
            .create(&mut uow, &req.user_id, req.priority, req.notes)
            .await?;
        uow.commit().await?;
        Ok(entry)
    }

    /// None (and no change) when nobody is waiting
    pub async fn call_next(&self, queue_id: &QueueId) -> Result<Option<QueueEntry>> {
        let mut uow = self.begin(queue_id).await?;
        let called = self.lifecycle.call_next(&mut uow).await?;
        if called.is_none() {
            uow.rollback().await?;
            return Ok(None);
        }
        uow.commit().await?;
        Ok(called)
    }

    pub async fn cancel_entry(&self, entry_id: &EntryId) -> Result<QueueEntry> {
        let (mut uow, entry) = self.begin_for_entry(entry_id).await?;
        let entry = self.lifecycle.cancel(&mut uow, entry).await?;
        uow.commit().await?;
        Ok(entry)
    }

    /// Mark served, archive history and release the slot
    pub async fn complete_entry(&self, entry_id: &EntryId) -> Result<QueueEntry> {
        let (mut uow, entry) = self.begin_for_entry(entry_id).await?;
        let (entry, _record) = self.lifecycle.mark_served(&mut uow, entry).await?;
        uow.commit().await?;
        Ok(entry)
    }

    pub async fn mark_no_show(&self, entry_id: &EntryId) -> Result<QueueEntry> {
        let (mut uow, entry) = self.begin_for_entry(entry_id).await?;
        let entry = self.lifecycle.mark_no_show(&mut uow, entry).await?;
        uow.commit().await?;
        Ok(entry)
    }

    pub async fn update_entry(&self, entry_id: &EntryId, update: &EntryUpdate) -> Result<QueueEntry> {
        let (mut uow, entry) = self.begin_for_entry(entry_id).await?;
        let entry = self.lifecycle.update(&mut uow, entry, update).await?;
        uow.commit().await?;
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // Reads (lock-free)
    // ------------------------------------------------------------------

    pub async fn get_position(&self, queue_id: &QueueId, user_id: &UserId) -> Result<Position> {
        self.positions.get_position(queue_id, user_id).await
    }

    pub async fn get_entry(&self, entry_id: &EntryId) -> Result<QueueEntry> {
        self.repos
            .entries
            .find_entry(entry_id)
            .await?
            .ok_or_else(|| AppError::entry_not_found(entry_id))
    }

    /// Entries of a queue in service order
    pub async fn list_entries(
        &self,
        queue_id: &QueueId,
        status: Option<EntryStatus>,
    ) -> Result<Vec<QueueEntry>> {
        self.repos.entries.find_by_queue(queue_id, status).await
    }

    /// A user's waiting/called entries across queues, newest first
    pub async fn user_entries(&self, user_id: &UserId) -> Result<Vec<QueueEntry>> {
        self.repos.entries.find_live_for_user(user_id).await
    }

    pub async fn is_user_in_queue(&self, queue_id: &QueueId, user_id: &UserId) -> Result<bool> {
        let live = self.repos.entries.find_live_for_user(user_id).await?;
        Ok(live.iter().any(|e| &e.queue_id == queue_id))
    }

    pub async fn queue_stats(&self, queue_id: &QueueId) -> Result<QueueStats> {
        self.stats.stats(queue_id).await
    }

    pub async fn business_stats(&self, business_id: &BusinessId) -> Result<BusinessStats> {
        self.stats.business_stats(business_id).await
    }

    pub async fn popular_queues(&self, limit: i64) -> Result<Vec<PopularQueue>> {
        self.stats.popular(limit).await
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        self.stats.categories().await
    }

    pub async fn queue_history(&self, queue_id: &QueueId, limit: i64) -> Result<Vec<QueueHistory>> {
        self.repos.history.history_for_queue(queue_id, limit).await
    }

    pub async fn user_history(&self, user_id: &UserId, limit: i64) -> Result<Vec<QueueHistory>> {
        self.repos.history.history_for_user(user_id, limit).await
    }
}
