// SQLite Transaction Implementation

use crate::entry_repository::{COUNT_AHEAD_SQL, SERVICE_ORDER};
use crate::error::map_sqlx_error;
use crate::rows::{EntryRow, QueueRow};
use async_trait::async_trait;
use ezyq_core::domain::{
    EntryId, Queue, QueueEntry, QueueHistory, QueueId, TicketNumber, UserId,
};
use ezyq_core::error::{AppError, Result};
use ezyq_core::port::{QueueTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

/// One unit of work. Dropping it without `commit` rolls back.
pub struct SqliteQueueTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
}

impl SqliteQueueTransaction {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteQueueTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl QueueTransaction for SqliteQueueTransaction {
    async fn lock_queue(&mut self, queue_id: &QueueId, now_millis: i64) -> Result<Option<Queue>> {
        // A write first: takes SQLite's write lock before anything is read,
        // so competing writers wait on busy_timeout instead of failing later
        let row = sqlx::query_as::<_, QueueRow>(
            "UPDATE queues SET updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(now_millis)
        .bind(queue_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_queue).transpose()
    }

    async fn save_queue(&mut self, queue: &Queue) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE queues
            SET name = ?, description = ?, category = ?, location = ?,
                max_capacity = ?, current_capacity = ?, avg_service_time = ?,
                status = ?, current_number = ?, last_ticket_number = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&queue.name)
        .bind(&queue.description)
        .bind(&queue.category)
        .bind(&queue.location)
        .bind(queue.max_capacity)
        .bind(queue.current_capacity)
        .bind(queue.avg_service_time)
        .bind(queue.status.as_str())
        .bind(queue.current_number)
        .bind(queue.last_ticket_number)
        .bind(queue.updated_at)
        .bind(&queue.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Queue {} not found", queue.id)));
        }
        Ok(())
    }

    async fn max_ticket_number(&mut self, queue_id: &QueueId) -> Result<Option<TicketNumber>> {
        sqlx::query_scalar("SELECT MAX(ticket_number) FROM queue_entries WHERE queue_id = ?")
            .bind(queue_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn insert_entry(&mut self, entry: &QueueEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_entries (
                id, queue_id, user_id, ticket_number, status, priority,
                joined_at, called_at, served_at, cancelled_at,
                estimated_wait_time, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.queue_id)
        .bind(&entry.user_id)
        .bind(entry.ticket_number)
        .bind(entry.status.as_str())
        .bind(entry.priority)
        .bind(entry.joined_at)
        .bind(entry.called_at)
        .bind(entry.served_at)
        .bind(entry.cancelled_at)
        .bind(entry.estimated_wait_time)
        .bind(&entry.notes)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_entry(&mut self, id: &EntryId) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM queue_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_live_for_user(
        &mut self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT * FROM queue_entries
            WHERE queue_id = ? AND user_id = ? AND status IN ('waiting', 'called')
            LIMIT 1
            "#,
        )
        .bind(queue_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn next_waiting(&mut self, queue_id: &QueueId) -> Result<Option<QueueEntry>> {
        let sql = format!(
            "SELECT * FROM queue_entries WHERE queue_id = ? AND status = 'waiting' ORDER BY {} LIMIT 1",
            SERVICE_ORDER
        );
        let row = sqlx::query_as::<_, EntryRow>(&sql)
            .bind(queue_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn count_waiting_ahead(&mut self, entry: &QueueEntry) -> Result<i64> {
        sqlx::query_scalar(COUNT_AHEAD_SQL)
            .bind(&entry.queue_id)
            .bind(&entry.id)
            .bind(entry.priority)
            .bind(entry.priority)
            .bind(entry.joined_at)
            .bind(entry.priority)
            .bind(entry.joined_at)
            .bind(entry.ticket_number)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn save_entry(&mut self, entry: &QueueEntry) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE queue_entries
            SET status = ?, priority = ?, called_at = ?, served_at = ?, cancelled_at = ?,
                estimated_wait_time = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(entry.status.as_str())
        .bind(entry.priority)
        .bind(entry.called_at)
        .bind(entry.served_at)
        .bind(entry.cancelled_at)
        .bind(entry.estimated_wait_time)
        .bind(&entry.notes)
        .bind(&entry.id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Queue entry {} not found", entry.id)));
        }
        Ok(())
    }

    async fn delete_live_entries(&mut self, queue_id: &QueueId) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM queue_entries WHERE queue_id = ? AND status IN ('waiting', 'called')",
        )
        .bind(queue_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn insert_history(&mut self, record: &QueueHistory) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_history (
                entry_id, queue_id, user_id, ticket_number, wait_time, service_time,
                status, joined_at, completed_at, rating, feedback
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.entry_id)
        .bind(&record.queue_id)
        .bind(&record.user_id)
        .bind(record.ticket_number)
        .bind(record.wait_time)
        .bind(record.service_time)
        .bind(record.status.as_str())
        .bind(record.joined_at)
        .bind(record.completed_at)
        .bind(record.rating)
        .bind(&record.feedback)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
