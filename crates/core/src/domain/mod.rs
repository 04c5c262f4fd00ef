// Domain Layer - Pure business logic and entities

pub mod entry;
pub mod error;
pub mod history;
pub mod queue;
pub mod stats;

// Re-exports
pub use entry::{EntryId, EntryStatus, EntryUpdate, Priority, QueueEntry, TicketNumber, UserId};
pub use error::DomainError;
pub use history::{whole_minutes, QueueHistory, MILLIS_PER_MINUTE};
pub use queue::{BusinessId, Queue, QueueDraft, QueueId, QueueStatus, QueueUpdate};
pub use stats::{estimate_wait, BusinessStats, PopularQueue, Position, QueueStats};
