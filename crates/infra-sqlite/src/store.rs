// SQLite store: one pool behind every store port

use crate::error::map_sqlx_error;
use crate::SqliteQueueTransaction;
use async_trait::async_trait;
use ezyq_core::error::Result;
use ezyq_core::port::{QueueTransaction, TransactionalQueueStore};
use sqlx::SqlitePool;

/// Implements QueueRepository, EntryRepository, HistoryRepository and
/// TransactionalQueueStore over one pool
#[derive(Clone)]
pub struct SqliteQueueStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TransactionalQueueStore for SqliteQueueStore {
    async fn begin_transaction(&self) -> Result<Box<dyn QueueTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteQueueTransaction::new(tx)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::{create_pool, run_migrations};
    use ezyq_core::domain::{Queue, QueueDraft};
    use ezyq_core::port::QueueRepository;

    pub(crate) async fn setup_test_store() -> SqliteQueueStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteQueueStore::new(pool)
    }

    pub(crate) fn test_queue(id: &str, business_id: &str, created_at: i64) -> Queue {
        Queue::new(
            id,
            created_at,
            QueueDraft {
                business_id: business_id.to_string(),
                name: format!("Queue {}", id),
                max_capacity: Some(5),
                ..Default::default()
            },
        )
        .unwrap()
    }

    pub(crate) async fn insert_test_queue(store: &SqliteQueueStore, id: &str) -> Queue {
        let queue = test_queue(id, "biz", 0);
        store.insert_queue(&queue).await.unwrap();
        queue
    }
}
