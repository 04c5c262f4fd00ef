// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid entry status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Queue {queue_id} is full (max capacity {max_capacity})")]
    CapacityExceeded { queue_id: String, max_capacity: i32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
