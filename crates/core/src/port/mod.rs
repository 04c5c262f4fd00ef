// Port Layer - Interfaces for external dependencies

pub mod entry_repository;
pub mod history_repository;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod mocks;
pub mod queue_repository;
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use entry_repository::EntryRepository;
pub use history_repository::HistoryRepository;
pub use id_provider::IdProvider;
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceStats};
pub use queue_repository::QueueRepository;
pub use time_provider::TimeProvider;
pub use transaction::{QueueTransaction, Transaction, TransactionalQueueStore};

use std::sync::Arc;

/// Store handles injected into the engine (one backing store, four views)
#[derive(Clone)]
pub struct Repositories {
    pub queues: Arc<dyn QueueRepository>,
    pub entries: Arc<dyn EntryRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub store: Arc<dyn TransactionalQueueStore>,
}

impl Repositories {
    /// Build all views from a single store implementation
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: QueueRepository
            + EntryRepository
            + HistoryRepository
            + TransactionalQueueStore
            + 'static,
    {
        Self {
            queues: store.clone(),
            entries: store.clone(),
            history: store.clone(),
            store,
        }
    }
}
