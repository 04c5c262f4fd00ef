// ============================================================================
// Test doubles for the store, clock and id ports
// ============================================================================
//
// `InMemoryQueueStore` implements every store port over one shared state.
// A transaction holds the whole-store lock and a rollback snapshot, so the
// double keeps the same atomicity guarantees as the SQLite adapter.

use super::*;
use crate::domain::{
    BusinessId, EntryId, EntryStatus, PopularQueue, Queue, QueueEntry, QueueHistory, QueueId,
    QueueStatus, TicketNumber, UserId,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Clock that only moves when told to
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeProvider for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Deterministic ids: `{prefix}-1`, `{prefix}-2`, ...
pub struct SequentialIdProvider {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(1),
        }
    }
}

impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub queues: HashMap<QueueId, Queue>,
    pub entries: HashMap<EntryId, QueueEntry>,
    pub history: Vec<QueueHistory>,
}

impl MemoryState {
    fn waiting_in(&self, queue_id: &str) -> impl Iterator<Item = &QueueEntry> {
        let queue_id = queue_id.to_string();
        self.entries
            .values()
            .filter(move |e| e.queue_id == queue_id && e.status == EntryStatus::Waiting)
    }

    fn count_ahead(&self, entry: &QueueEntry) -> i64 {
        self.waiting_in(&entry.queue_id)
            .filter(|e| e.id != entry.id && e.is_ahead_of(entry))
            .count() as i64
    }

    fn live_for_user(&self, queue_id: &str, user_id: &str) -> Option<QueueEntry> {
        self.entries
            .values()
            .find(|e| e.queue_id == queue_id && e.user_id == user_id && e.status.is_live())
            .cloned()
    }

    fn active_sorted(&self, category: Option<&str>, limit: i64) -> Vec<Queue> {
        let mut queues: Vec<Queue> = self
            .queues
            .values()
            .filter(|q| q.status == QueueStatus::Active)
            .filter(|q| category.map_or(true, |c| q.category.as_deref() == Some(c)))
            .cloned()
            .collect();
        queues.sort_by(|a, b| {
            a.current_capacity
                .cmp(&b.current_capacity)
                .then(b.created_at.cmp(&a.created_at))
        });
        queues.truncate(limit.max(0) as usize);
        queues
    }
}

/// In-memory implementation of every store port
#[derive(Clone, Default)]
pub struct InMemoryQueueStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current committed state
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Seed a history record directly (e.g. to test time windows)
    pub async fn seed_history(&self, record: QueueHistory) {
        self.state.lock().await.history.push(record);
    }
}

#[async_trait]
impl QueueRepository for InMemoryQueueStore {
    async fn insert_queue(&self, queue: &Queue) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.queues.contains_key(&queue.id) {
            return Err(AppError::Database(format!("Queue {} already exists", queue.id)));
        }
        state.queues.insert(queue.id.clone(), queue.clone());
        Ok(())
    }

    async fn find_queue(&self, id: &QueueId) -> Result<Option<Queue>> {
        Ok(self.state.lock().await.queues.get(id).cloned())
    }

    async fn find_by_business(&self, business_id: &BusinessId) -> Result<Vec<Queue>> {
        let state = self.state.lock().await;
        let mut queues: Vec<Queue> = state
            .queues
            .values()
            .filter(|q| &q.business_id == business_id)
            .cloned()
            .collect();
        queues.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(queues)
    }

    async fn find_active(&self, limit: i64) -> Result<Vec<Queue>> {
        Ok(self.state.lock().await.active_sorted(None, limit))
    }

    async fn find_by_category(&self, category: &str, limit: i64) -> Result<Vec<Queue>> {
        Ok(self.state.lock().await.active_sorted(Some(category), limit))
    }

    async fn search(&self, query: &str, category: Option<&str>, limit: i64) -> Result<Vec<Queue>> {
        let needle = query.to_ascii_lowercase();
        let contains = |text: &str| text.to_ascii_lowercase().contains(&needle);

        let state = self.state.lock().await;
        let mut queues: Vec<Queue> = state
            .queues
            .values()
            .filter(|q| category.map_or(true, |c| q.category.as_deref() == Some(c)))
            .filter(|q| contains(&q.name) || q.description.as_deref().is_some_and(|d| contains(d)))
            .cloned()
            .collect();
        queues.sort_by(|a, b| {
            a.current_capacity
                .cmp(&b.current_capacity)
                .then(b.created_at.cmp(&a.created_at))
        });
        queues.truncate(limit.max(0) as usize);
        Ok(queues)
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let state = self.state.lock().await;
        let set: BTreeSet<String> = state
            .queues
            .values()
            .filter_map(|q| q.category.clone())
            .collect();
        Ok(set.into_iter().collect())
    }

    async fn count_for_business(&self, business_id: &BusinessId) -> Result<(i64, i64)> {
        let state = self.state.lock().await;
        let owned = state.queues.values().filter(|q| &q.business_id == business_id);
        let (mut total, mut active) = (0, 0);
        for queue in owned {
            total += 1;
            if queue.status == QueueStatus::Active {
                active += 1;
            }
        }
        Ok((total, active))
    }

    async fn find_popular(&self, since_millis: i64, limit: i64) -> Result<Vec<PopularQueue>> {
        let state = self.state.lock().await;
        let mut ranked: Vec<PopularQueue> = state
            .queues
            .values()
            .filter(|q| q.status == QueueStatus::Active)
            .map(|q| PopularQueue {
                entry_count: state
                    .entries
                    .values()
                    .filter(|e| e.queue_id == q.id && e.joined_at > since_millis)
                    .count() as i64,
                queue: q.clone(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.entry_count
                .cmp(&a.entry_count)
                .then(b.queue.created_at.cmp(&a.queue.created_at))
        });
        ranked.truncate(limit.max(0) as usize);
        Ok(ranked)
    }

    async fn delete_queue(&self, id: &QueueId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let existed = state.queues.remove(id).is_some();
        state.entries.retain(|_, e| &e.queue_id != id);
        Ok(existed)
    }

    async fn bulk_update_status(
        &self,
        ids: &[QueueId],
        status: QueueStatus,
        now_millis: i64,
    ) -> Result<u64> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for id in ids {
            if let Some(queue) = state.queues.get_mut(id) {
                queue.status = status;
                queue.updated_at = now_millis;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl EntryRepository for InMemoryQueueStore {
    async fn find_entry(&self, id: &EntryId) -> Result<Option<QueueEntry>> {
        Ok(self.state.lock().await.entries.get(id).cloned())
    }

    async fn find_waiting_for_user(
        &self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>> {
        let state = self.state.lock().await;
        let found = state
            .waiting_in(queue_id)
            .find(|e| &e.user_id == user_id)
            .cloned();
        Ok(found)
    }

    async fn count_waiting_ahead(&self, entry: &QueueEntry) -> Result<i64> {
        Ok(self.state.lock().await.count_ahead(entry))
    }

    async fn count_by_status(&self, queue_id: &QueueId, status: EntryStatus) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .values()
            .filter(|e| &e.queue_id == queue_id && e.status == status)
            .count() as i64)
    }

    async fn find_by_queue(
        &self,
        queue_id: &QueueId,
        status: Option<EntryStatus>,
    ) -> Result<Vec<QueueEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<QueueEntry> = state
            .entries
            .values()
            .filter(|e| &e.queue_id == queue_id)
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect();
        entries.sort_by(QueueEntry::service_order);
        Ok(entries)
    }

    async fn find_live_for_user(&self, user_id: &UserId) -> Result<Vec<QueueEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<QueueEntry> = state
            .entries
            .values()
            .filter(|e| &e.user_id == user_id && e.status.is_live())
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
        Ok(entries)
    }
}

#[async_trait]
impl HistoryRepository for InMemoryQueueStore {
    async fn average_wait_since(
        &self,
        queue_id: &QueueId,
        since_millis: i64,
    ) -> Result<Option<f64>> {
        let state = self.state.lock().await;
        let waits: Vec<i64> = state
            .history
            .iter()
            .filter(|h| &h.queue_id == queue_id && h.completed_at > since_millis)
            .map(|h| h.wait_time)
            .collect();
        if waits.is_empty() {
            return Ok(None);
        }
        Ok(Some(waits.iter().sum::<i64>() as f64 / waits.len() as f64))
    }

    async fn count_for_queue(&self, queue_id: &QueueId) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.history.iter().filter(|h| &h.queue_id == queue_id).count() as i64)
    }

    async fn served_for_business(&self, business_id: &BusinessId) -> Result<(i64, i64)> {
        let state = self.state.lock().await;
        let owned: HashSet<&QueueId> = state
            .queues
            .values()
            .filter(|q| &q.business_id == business_id)
            .map(|q| &q.id)
            .collect();
        let records: Vec<&QueueHistory> = state
            .history
            .iter()
            .filter(|h| owned.contains(&h.queue_id))
            .collect();
        let customers: HashSet<&UserId> = records.iter().map(|h| &h.user_id).collect();
        Ok((records.len() as i64, customers.len() as i64))
    }

    async fn history_for_queue(&self, queue_id: &QueueId, limit: i64) -> Result<Vec<QueueHistory>> {
        let state = self.state.lock().await;
        let mut records: Vec<QueueHistory> = state
            .history
            .iter()
            .filter(|h| &h.queue_id == queue_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }

    async fn history_for_user(&self, user_id: &UserId, limit: i64) -> Result<Vec<QueueHistory>> {
        let state = self.state.lock().await;
        let mut records: Vec<QueueHistory> = state
            .history
            .iter()
            .filter(|h| &h.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }
}

#[async_trait]
impl TransactionalQueueStore for InMemoryQueueStore {
    async fn begin_transaction(&self) -> Result<Box<dyn QueueTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let backup = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            backup: Some(backup),
        }))
    }
}

/// Holds the whole-store lock; restores the snapshot unless committed
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    backup: Option<MemoryState>,
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            *self.guard = backup;
        }
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.backup = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // Drop restores the snapshot
        Ok(())
    }
}

#[async_trait]
impl QueueTransaction for InMemoryTransaction {
    async fn lock_queue(&mut self, queue_id: &QueueId, now_millis: i64) -> Result<Option<Queue>> {
        Ok(self.guard.queues.get_mut(queue_id).map(|queue| {
            queue.updated_at = now_millis;
            queue.clone()
        }))
    }

    async fn save_queue(&mut self, queue: &Queue) -> Result<()> {
        if queue.current_capacity < 0 || queue.current_capacity > queue.max_capacity {
            return Err(AppError::ConcurrencyViolation(format!(
                "Queue {} occupancy {} outside [0, {}]",
                queue.id, queue.current_capacity, queue.max_capacity
            )));
        }
        match self.guard.queues.get_mut(&queue.id) {
            Some(stored) => {
                *stored = queue.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Queue {} not found", queue.id))),
        }
    }

    async fn max_ticket_number(&mut self, queue_id: &QueueId) -> Result<Option<TicketNumber>> {
        Ok(self
            .guard
            .entries
            .values()
            .filter(|e| &e.queue_id == queue_id)
            .map(|e| e.ticket_number)
            .max())
    }

    async fn insert_entry(&mut self, entry: &QueueEntry) -> Result<()> {
        let duplicate = self
            .guard
            .entries
            .values()
            .any(|e| e.queue_id == entry.queue_id && e.ticket_number == entry.ticket_number);
        if duplicate {
            return Err(AppError::ConcurrencyViolation(format!(
                "Ticket {} already issued in queue {}",
                entry.ticket_number, entry.queue_id
            )));
        }
        self.guard.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn find_entry(&mut self, id: &EntryId) -> Result<Option<QueueEntry>> {
        Ok(self.guard.entries.get(id).cloned())
    }

    async fn find_live_for_user(
        &mut self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>> {
        Ok(self.guard.live_for_user(queue_id, user_id))
    }

    async fn next_waiting(&mut self, queue_id: &QueueId) -> Result<Option<QueueEntry>> {
        Ok(self
            .guard
            .waiting_in(queue_id)
            .min_by(|a, b| QueueEntry::service_order(a, b))
            .cloned())
    }

    async fn count_waiting_ahead(&mut self, entry: &QueueEntry) -> Result<i64> {
        Ok(self.guard.count_ahead(entry))
    }

    async fn save_entry(&mut self, entry: &QueueEntry) -> Result<()> {
        match self.guard.entries.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Queue entry {} not found", entry.id))),
        }
    }

    async fn delete_live_entries(&mut self, queue_id: &QueueId) -> Result<u64> {
        let before = self.guard.entries.len();
        self.guard
            .entries
            .retain(|_, e| !(&e.queue_id == queue_id && e.status.is_live()));
        Ok((before - self.guard.entries.len()) as u64)
    }

    async fn insert_history(&mut self, record: &QueueHistory) -> Result<()> {
        if self.guard.history.iter().any(|h| h.entry_id == record.entry_id) {
            return Err(AppError::ConcurrencyViolation(format!(
                "History for entry {} already recorded",
                record.entry_id
            )));
        }
        self.guard.history.push(record.clone());
        Ok(())
    }
}
