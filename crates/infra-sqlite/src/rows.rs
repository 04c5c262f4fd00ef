// SQLite row representations

use ezyq_core::domain::{EntryStatus, PopularQueue, Queue, QueueEntry, QueueHistory, QueueStatus};
use ezyq_core::error::{AppError, Result};

fn corrupt(table: &str, id: &str, err: impl std::fmt::Display) -> AppError {
    AppError::Database(format!("Invalid {} row {}: {}", table, id, err))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct QueueRow {
    id: String,
    business_id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    location: Option<String>,
    max_capacity: i32,
    current_capacity: i32,
    avg_service_time: i32,
    status: String,
    current_number: i64,
    last_ticket_number: i64,
    created_at: i64,
    updated_at: i64,
}

impl QueueRow {
    pub(crate) fn into_queue(self) -> Result<Queue> {
        let status = self
            .status
            .parse::<QueueStatus>()
            .map_err(|e| corrupt("queues", &self.id, e))?;

        Ok(Queue {
            id: self.id,
            business_id: self.business_id,
            name: self.name,
            description: self.description,
            category: self.category,
            location: self.location,
            max_capacity: self.max_capacity,
            current_capacity: self.current_capacity,
            avg_service_time: self.avg_service_time,
            status,
            current_number: self.current_number,
            last_ticket_number: self.last_ticket_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PopularRow {
    #[sqlx(flatten)]
    queue: QueueRow,
    entry_count: i64,
}

impl PopularRow {
    pub(crate) fn into_popular(self) -> Result<PopularQueue> {
        Ok(PopularQueue {
            queue: self.queue.into_queue()?,
            entry_count: self.entry_count,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntryRow {
    id: String,
    queue_id: String,
    user_id: String,
    ticket_number: i64,
    status: String,
    priority: i32,
    joined_at: i64,
    called_at: Option<i64>,
    served_at: Option<i64>,
    cancelled_at: Option<i64>,
    estimated_wait_time: Option<i64>,
    notes: Option<String>,
}

impl EntryRow {
    pub(crate) fn into_entry(self) -> Result<QueueEntry> {
        let status = self
            .status
            .parse::<EntryStatus>()
            .map_err(|e| corrupt("queue_entries", &self.id, e))?;

        Ok(QueueEntry {
            id: self.id,
            queue_id: self.queue_id,
            user_id: self.user_id,
            ticket_number: self.ticket_number,
            status,
            priority: self.priority,
            joined_at: self.joined_at,
            called_at: self.called_at,
            served_at: self.served_at,
            cancelled_at: self.cancelled_at,
            estimated_wait_time: self.estimated_wait_time,
            notes: self.notes,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HistoryRow {
    entry_id: String,
    queue_id: String,
    user_id: String,
    ticket_number: i64,
    wait_time: i64,
    service_time: i64,
    status: String,
    joined_at: i64,
    completed_at: i64,
    rating: Option<i32>,
    feedback: Option<String>,
}

impl HistoryRow {
    pub(crate) fn into_history(self) -> Result<QueueHistory> {
        let status = self
            .status
            .parse::<EntryStatus>()
            .map_err(|e| corrupt("queue_history", &self.entry_id, e))?;

        Ok(QueueHistory {
            entry_id: self.entry_id,
            queue_id: self.queue_id,
            user_id: self.user_id,
            ticket_number: self.ticket_number,
            wait_time: self.wait_time,
            service_time: self.service_time,
            status,
            joined_at: self.joined_at,
            completed_at: self.completed_at,
            rating: self.rating,
            feedback: self.feedback,
        })
    }
}

/// Convert a batch of rows, failing on the first corrupt one
pub(crate) fn convert_all<R, T>(rows: Vec<R>, convert: impl Fn(R) -> Result<T>) -> Result<Vec<T>> {
    rows.into_iter().map(convert).collect()
}
