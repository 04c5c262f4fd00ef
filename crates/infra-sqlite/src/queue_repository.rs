// SQLite QueueRepository Implementation

use crate::error::map_sqlx_error;
use crate::rows::{convert_all, PopularRow, QueueRow};
use crate::SqliteQueueStore;
use async_trait::async_trait;
use ezyq_core::domain::{BusinessId, PopularQueue, Queue, QueueId, QueueStatus};
use ezyq_core::error::Result;
use ezyq_core::port::QueueRepository;

#[async_trait]
impl QueueRepository for SqliteQueueStore {
    async fn insert_queue(&self, queue: &Queue) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queues (
                id, business_id, name, description, category, location,
                max_capacity, current_capacity, avg_service_time, status,
                current_number, last_ticket_number, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&queue.id)
        .bind(&queue.business_id)
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
        .bind(queue.created_at)
        .bind(queue.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_queue(&self, id: &QueueId) -> Result<Option<Queue>> {
        let row = sqlx::query_as::<_, QueueRow>("SELECT * FROM queues WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(QueueRow::into_queue).transpose()
    }

    async fn find_by_business(&self, business_id: &BusinessId) -> Result<Vec<Queue>> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            "SELECT * FROM queues WHERE business_id = ? ORDER BY created_at DESC",
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, QueueRow::into_queue)
    }

    async fn find_active(&self, limit: i64) -> Result<Vec<Queue>> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            r#"
            SELECT * FROM queues
            WHERE status = 'active'
            ORDER BY current_capacity ASC, created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, QueueRow::into_queue)
    }

    async fn find_by_category(&self, category: &str, limit: i64) -> Result<Vec<Queue>> {
        let rows: Vec<QueueRow> = sqlx::query_as(
            r#"
            SELECT * FROM queues
            WHERE status = 'active' AND category = ?
            ORDER BY current_capacity ASC, created_at DESC
            LIMIT ?
            "#,
        )
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, QueueRow::into_queue)
    }

    async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Queue>> {
        let pattern = format!("%{}%", escape_like(query));
        let rows: Vec<QueueRow> = sqlx::query_as(
            r#"
            SELECT * FROM queues
            WHERE (name LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR category = ?2)
            ORDER BY current_capacity ASC, created_at DESC
            LIMIT ?3
            "#,
        )
        .bind(pattern)
        .bind(category)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, QueueRow::into_queue)
    }

    async fn categories(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT category FROM queues WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_for_business(&self, business_id: &BusinessId) -> Result<(i64, i64)> {
        sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0)
            FROM queues
            WHERE business_id = ?
            "#,
        )
        .bind(business_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_popular(&self, since_millis: i64, limit: i64) -> Result<Vec<PopularQueue>> {
        let rows: Vec<PopularRow> = sqlx::query_as(
            r#"
            SELECT q.*, COUNT(e.id) AS entry_count
            FROM queues q
            LEFT JOIN queue_entries e ON e.queue_id = q.id AND e.joined_at > ?
            WHERE q.status = 'active'
            GROUP BY q.id
            ORDER BY entry_count DESC, q.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(since_millis)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        convert_all(rows, PopularRow::into_popular)
    }

    async fn delete_queue(&self, id: &QueueId) -> Result<bool> {
        // Entries go with it (ON DELETE CASCADE); history rows stay
        let result = sqlx::query("DELETE FROM queues WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn bulk_update_status(
        &self,
        ids: &[QueueId],
        status: QueueStatus,
        now_millis: i64,
    ) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE queues SET status = ?, updated_at = ? WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(status.as_str()).bind(now_millis);
        for id in ids {
            query = query.bind(id);
        }

        let result = query.execute(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

/// Match `%`, `_` and `\` literally inside a LIKE pattern
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{insert_test_queue, setup_test_store, test_queue};
    use ezyq_core::domain::QueueEntry;
    use ezyq_core::port::{EntryRepository, TransactionalQueueStore};

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = setup_test_store().await;
        let queue = insert_test_queue(&store, "q1").await;

        let found = store.find_queue(&queue.id).await.unwrap().unwrap();
        assert_eq!(found, queue);
        assert!(store.find_queue(&"nope".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listings_and_counts() {
        let store = setup_test_store().await;

        let mut busy = test_queue("busy", "biz", 1);
        busy.current_capacity = 3;
        busy.category = Some("health".to_string());
        store.insert_queue(&busy).await.unwrap();

        let mut idle = test_queue("idle", "biz", 2);
        idle.category = Some("food".to_string());
        store.insert_queue(&idle).await.unwrap();

        let mut closed = test_queue("closed", "biz", 3);
        closed.status = QueueStatus::Closed;
        closed.category = Some("food".to_string());
        store.insert_queue(&closed).await.unwrap();

        store.insert_queue(&test_queue("other", "acme", 4)).await.unwrap();

        let active: Vec<_> = store
            .find_active(10)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(active, vec!["other", "idle", "busy"]);

        let food = store.find_by_category("food", 10).await.unwrap();
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].id, "idle");

        assert_eq!(store.categories().await.unwrap(), vec!["food", "health"]);
        assert_eq!(
            store.count_for_business(&"biz".to_string()).await.unwrap(),
            (3, 2)
        );
        assert_eq!(
            store.count_for_business(&"nobody".to_string()).await.unwrap(),
            (0, 0)
        );

        let mine = store.find_by_business(&"biz".to_string()).await.unwrap();
        assert_eq!(mine[0].id, "closed");
    }

    #[tokio::test]
    async fn test_search_matches_name_and_description() {
        let store = setup_test_store().await;

        let mut bakery = test_queue("bakery", "biz", 1);
        bakery.name = "Corner Bakery".to_string();
        bakery.category = Some("food".to_string());
        store.insert_queue(&bakery).await.unwrap();

        let mut deli = test_queue("deli", "biz", 2);
        deli.name = "Deli".to_string();
        deli.description = Some("Fresh bread and sandwiches".to_string());
        deli.category = Some("food".to_string());
        deli.current_capacity = 2;
        store.insert_queue(&deli).await.unwrap();

        let mut clinic = test_queue("clinic", "biz", 3);
        clinic.name = "Bread of Life Clinic".to_string();
        clinic.category = Some("health".to_string());
        store.insert_queue(&clinic).await.unwrap();

        let ids = |queues: Vec<Queue>| queues.into_iter().map(|q| q.id).collect::<Vec<_>>();

        assert_eq!(ids(store.search("BREAD", None, 10).await.unwrap()), vec!["clinic", "deli"]);
        assert_eq!(ids(store.search("bread", Some("food"), 10).await.unwrap()), vec!["deli"]);
        assert_eq!(ids(store.search("bakery", None, 10).await.unwrap()), vec!["bakery"]);
        assert_eq!(store.search("", None, 2).await.unwrap().len(), 2);

        // Wildcards in the query are literal
        assert!(store.search("%", None, 10).await.unwrap().is_empty());
        assert!(store.search("B_kery", None, 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_popular_counts_recent_joins() {
        let store = setup_test_store().await;
        insert_test_queue(&store, "a").await;
        insert_test_queue(&store, "b").await;

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert_entry(&QueueEntry::new("e1", "b", "u1", 1, 0, 500))
            .await
            .unwrap();
        tx.insert_entry(&QueueEntry::new("e2", "a", "u2", 1, 0, 50))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let popular = store.find_popular(100, 10).await.unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].queue.id, "b");
        assert_eq!(popular[0].entry_count, 1);
        assert_eq!(popular[1].entry_count, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_entries() {
        let store = setup_test_store().await;
        insert_test_queue(&store, "q1").await;

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert_entry(&QueueEntry::new("e1", "q1", "u1", 1, 0, 0))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(store.delete_queue(&"q1".to_string()).await.unwrap());
        assert!(!store.delete_queue(&"q1".to_string()).await.unwrap());
        assert!(store.find_entry(&"e1".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_update_status() {
        let store = setup_test_store().await;
        insert_test_queue(&store, "a").await;
        insert_test_queue(&store, "b").await;

        let ids = vec!["a".to_string(), "b".to_string(), "ghost".to_string()];
        let changed = store
            .bulk_update_status(&ids, QueueStatus::Paused, 42)
            .await
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(store.bulk_update_status(&[], QueueStatus::Active, 0).await.unwrap(), 0);

        let a = store.find_queue(&"a".to_string()).await.unwrap().unwrap();
        assert_eq!(a.status, QueueStatus::Paused);
        assert_eq!(a.updated_at, 42);
    }
}
