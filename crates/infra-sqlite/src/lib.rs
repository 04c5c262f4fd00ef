// ezyQ Infrastructure - SQLite Adapter
// Implements: QueueRepository, EntryRepository, HistoryRepository,
// TransactionalQueueStore, Maintenance

mod connection;
mod entry_repository;
mod error;
mod history_repository;
mod maintenance_impl;
mod migration;
mod queue_repository;
mod rows;
mod store;
mod transaction;

pub use connection::create_pool;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use store::SqliteQueueStore;
pub use transaction::SqliteQueueTransaction;

// sqlx::Error -> AppError goes through error::map_sqlx_error
// (orphan rules forbid From<sqlx::Error> for AppError here)
