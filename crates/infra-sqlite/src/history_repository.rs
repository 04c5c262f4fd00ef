// SQLite HistoryRepository Implementation

use crate::error::map_sqlx_error;
use crate::rows::{convert_all, HistoryRow};
use crate::SqliteQueueStore;
use async_trait::async_trait;
use ezyq_core::domain::{BusinessId, QueueHistory, QueueId, UserId};
use ezyq_core::error::Result;
use ezyq_core::port::HistoryRepository;

#[async_trait]
impl HistoryRepository for SqliteQueueStore {
    async fn average_wait_since(
        &self,
        queue_id: &QueueId,
        since_millis: i64,
    ) -> Result<Option<f64>> {
        // AVG over no rows is NULL
        sqlx::query_scalar(
            "SELECT AVG(wait_time) FROM queue_history WHERE queue_id = ? AND completed_at > ?",
        )
        .bind(queue_id)
        .bind(since_millis)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_for_queue(&self, queue_id: &QueueId) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM queue_history WHERE queue_id = ?")
            .bind(queue_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn served_for_business(&self, business_id: &BusinessId) -> Result<(i64, i64)> {
        sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(DISTINCT h.user_id)
            FROM queue_history h
            JOIN queues q ON q.id = h.queue_id
            WHERE q.business_id = ? AND h.status = 'served'
            "#,
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn history_for_queue(&self, queue_id: &QueueId, limit: i64) -> Result<Vec<QueueHistory>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT * FROM queue_history
            WHERE queue_id = ?
            ORDER BY completed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(queue_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, HistoryRow::into_history)
    }

    async fn history_for_user(&self, user_id: &UserId, limit: i64) -> Result<Vec<QueueHistory>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT * FROM queue_history
            WHERE user_id = ?
            ORDER BY completed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, HistoryRow::into_history)
    }
}
