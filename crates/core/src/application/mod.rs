// Application Layer - Engine components and use cases

pub mod admin;
pub mod capacity;
pub mod config;
pub mod history_archiver;
pub mod lifecycle;
pub mod locks;
pub mod maintenance;
pub mod position;
pub mod service;
pub mod stats;
pub mod ticket_allocator;
pub mod unit_of_work;

// Re-exports
pub use admin::QueueAdmin;
pub use capacity::CapacityTracker;
pub use config::EngineConfig;
pub use history_archiver::HistoryArchiver;
pub use lifecycle::EntryLifecycle;
pub use locks::QueueLocks;
pub use maintenance::MaintenanceScheduler;
pub use position::PositionEstimator;
pub use service::{JoinRequest, QueueService};
pub use stats::QueueStatsAggregator;
pub use ticket_allocator::TicketAllocator;
pub use unit_of_work::UnitOfWork;
