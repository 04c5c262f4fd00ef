// Central Error Type for the Engine

use crate::domain::DomainError;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A storage constraint caught a duplicate ticket, a capacity overshoot or a
    /// second history row. Only reachable when a caller bypasses the per-queue lock.
    #[error("Concurrency violation: {0}")]
    ConcurrencyViolation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Flat error taxonomy exposed to callers (RPC codes, user-facing messages)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InvalidTransition,
    CapacityExceeded,
    ConcurrencyViolation,
    Storage,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Domain(DomainError::InvalidInput(_)) => ErrorKind::InvalidInput,
            AppError::Domain(DomainError::InvalidTransition { .. }) => ErrorKind::InvalidTransition,
            AppError::Domain(DomainError::CapacityExceeded { .. }) => ErrorKind::CapacityExceeded,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::ConcurrencyViolation(_) => ErrorKind::ConcurrencyViolation,
            AppError::Database(_) => ErrorKind::Storage,
            AppError::Config(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn queue_not_found(queue_id: &str) -> Self {
        AppError::NotFound(format!("Queue {} not found", queue_id))
    }

    pub(crate) fn entry_not_found(entry_id: &str) -> Self {
        AppError::NotFound(format!("Queue entry {} not found", entry_id))
    }
}

// Note: sqlx::Error conversion is handled in infra-sqlite
// by mapping into AppError::Database / AppError::ConcurrencyViolation
