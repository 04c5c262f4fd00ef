// SQLite EntryRepository Implementation

use crate::error::map_sqlx_error;
use crate::rows::{convert_all, EntryRow};
use crate::SqliteQueueStore;
use async_trait::async_trait;
use ezyq_core::domain::{EntryId, EntryStatus, QueueEntry, QueueId, UserId};
use ezyq_core::error::Result;
use ezyq_core::port::EntryRepository;

/// Service order, shared by every ordered entry query
pub(crate) const SERVICE_ORDER: &str = "priority DESC, joined_at ASC, ticket_number ASC";

/// Waiting entries strictly ahead of a given (id, priority, joined_at, ticket) in service order
pub(crate) const COUNT_AHEAD_SQL: &str = r#"
    SELECT COUNT(*) FROM queue_entries
    WHERE queue_id = ? AND status = 'waiting' AND id != ?
      AND (priority > ?
           OR (priority = ? AND joined_at < ?)
           OR (priority = ? AND joined_at = ? AND ticket_number < ?))
"#;

#[async_trait]
impl EntryRepository for SqliteQueueStore {
    async fn find_entry(&self, id: &EntryId) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>("SELECT * FROM queue_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn find_waiting_for_user(
        &self,
        queue_id: &QueueId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT * FROM queue_entries
            WHERE queue_id = ? AND user_id = ? AND status = 'waiting'
            LIMIT 1
            "#,
        )
        .bind(queue_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(EntryRow::into_entry).transpose()
    }

    async fn count_waiting_ahead(&self, entry: &QueueEntry) -> Result<i64> {
        sqlx::query_scalar(COUNT_AHEAD_SQL)
            .bind(&entry.queue_id)
            .bind(&entry.id)
            .bind(entry.priority)
            .bind(entry.priority)
            .bind(entry.joined_at)
            .bind(entry.priority)
            .bind(entry.joined_at)
            .bind(entry.ticket_number)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_by_status(&self, queue_id: &QueueId, status: EntryStatus) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM queue_entries WHERE queue_id = ? AND status = ?")
            .bind(queue_id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_queue(
        &self,
        queue_id: &QueueId,
        status: Option<EntryStatus>,
    ) -> Result<Vec<QueueEntry>> {
        let rows: Vec<EntryRow> = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT * FROM queue_entries WHERE queue_id = ? AND status = ? ORDER BY {}",
                    SERVICE_ORDER
                );
                sqlx::query_as::<_, EntryRow>(&sql)
                    .bind(queue_id)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT * FROM queue_entries WHERE queue_id = ? ORDER BY {}",
                    SERVICE_ORDER
                );
                sqlx::query_as::<_, EntryRow>(&sql)
                    .bind(queue_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        convert_all(rows, EntryRow::into_entry)
    }

    async fn find_live_for_user(&self, user_id: &UserId) -> Result<Vec<QueueEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            r#"
            SELECT * FROM queue_entries
            WHERE user_id = ? AND status IN ('waiting', 'called')
            ORDER BY joined_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, EntryRow::into_entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{insert_test_queue, setup_test_store};
    use ezyq_core::port::TransactionalQueueStore;

    async fn seed(store: &SqliteQueueStore, entries: &[QueueEntry]) {
        let mut tx = store.begin_transaction().await.unwrap();
        for entry in entries {
            tx.insert_entry(entry).await.unwrap();
        }
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_service_order_and_ranks() {
        let store = setup_test_store().await;
        insert_test_queue(&store, "q1").await;

        let u1 = QueueEntry::new("e1", "q1", "u1", 1, 0, 100);
        let u2 = QueueEntry::new("e2", "q1", "u2", 2, 5, 200);
        let u3 = QueueEntry::new("e3", "q1", "u3", 3, 0, 300);
        // Same millisecond as u3, later ticket
        let u4 = QueueEntry::new("e4", "q1", "u4", 4, 0, 300);
        seed(&store, &[u1.clone(), u2.clone(), u3.clone(), u4.clone()]).await;

        let order: Vec<_> = store
            .find_by_queue(&"q1".to_string(), Some(EntryStatus::Waiting))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.user_id)
            .collect();
        assert_eq!(order, vec!["u2", "u1", "u3", "u4"]);

        assert_eq!(store.count_waiting_ahead(&u2).await.unwrap(), 0);
        assert_eq!(store.count_waiting_ahead(&u1).await.unwrap(), 1);
        assert_eq!(store.count_waiting_ahead(&u3).await.unwrap(), 2);
        assert_eq!(store.count_waiting_ahead(&u4).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let store = setup_test_store().await;
        insert_test_queue(&store, "q1").await;
        insert_test_queue(&store, "q2").await;

        let mut called = QueueEntry::new("e1", "q1", "u1", 1, 0, 10);
        called.call(20).unwrap();
        let waiting = QueueEntry::new("e2", "q2", "u1", 1, 0, 30);
        let mut gone = QueueEntry::new("e3", "q2", "u2", 2, 0, 40);
        gone.cancel(50).unwrap();
        seed(&store, &[called, waiting, gone]).await;

        let live: Vec<_> = store
            .find_live_for_user(&"u1".to_string())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(live, vec!["e2", "e1"]);

        // Called entries have no waiting position
        assert!(store
            .find_waiting_for_user(&"q1".to_string(), &"u1".to_string())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_waiting_for_user(&"q2".to_string(), &"u1".to_string())
            .await
            .unwrap()
            .is_some());

        assert_eq!(
            store
                .count_by_status(&"q2".to_string(), EntryStatus::Cancelled)
                .await
                .unwrap(),
            1
        );
        let all = store.find_by_queue(&"q2".to_string(), None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
