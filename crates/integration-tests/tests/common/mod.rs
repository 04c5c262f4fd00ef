//! Shared setup: a QueueService over a real SQLite store with a manual clock

#![allow(dead_code)]

use ezyq_core::application::{EngineConfig, QueueService};
use ezyq_core::domain::{Queue, QueueDraft};
use ezyq_core::port::mocks::{ManualClock, SequentialIdProvider};
use ezyq_core::port::Repositories;
use ezyq_infra_sqlite::{create_pool, run_migrations, SqliteQueueStore};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

pub const MINUTE: i64 = 60_000;
pub const DAY: i64 = 24 * 60 * MINUTE;
pub const START: i64 = 1_700_000_000_000;

pub struct Harness {
    pub service: Arc<QueueService>,
    pub store: Arc<SqliteQueueStore>,
    pub clock: Arc<ManualClock>,
    pub pool: SqlitePool,
}

impl Harness {
    pub async fn open(database_url: &str) -> Self {
        let pool = create_pool(database_url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let store = Arc::new(SqliteQueueStore::new(pool.clone()));
        let clock = Arc::new(ManualClock::new(START));
        let service = QueueService::new(
            Repositories::from_store(store.clone()),
            Arc::new(SequentialIdProvider::new(uuid::Uuid::new_v4().to_string())),
            clock.clone(),
            EngineConfig::default(),
        );

        Self {
            service: Arc::new(service),
            store,
            clock,
            pool,
        }
    }

    pub async fn memory() -> Self {
        Self::open("sqlite::memory:").await
    }

    pub async fn create_queue(&self, max_capacity: i32, avg_service_time: i32) -> Queue {
        self.service
            .admin()
            .create_queue(QueueDraft {
                business_id: "biz".to_string(),
                name: "Front desk".to_string(),
                max_capacity: Some(max_capacity),
                avg_service_time: Some(avg_service_time),
                ..Default::default()
            })
            .await
            .unwrap()
    }
}

/// Fresh database file under the system temp dir
pub fn temp_db(name: &str) -> (PathBuf, String) {
    let path = std::env::temp_dir().join(format!("ezyq_{}_{}.db", name, uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    (path, url)
}

pub fn remove_db(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
