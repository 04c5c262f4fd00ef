//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use ezyq_core::error::AppError;
use ezyq_core::ErrorKind;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const INVALID_INPUT: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const INVALID_TRANSITION: i32 = 4002;
    pub const THROTTLED: i32 = 4003;
    pub const CAPACITY_EXCEEDED: i32 = 4004;
    pub const CONCURRENCY_VIOLATION: i32 = 4009;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
}

pub fn code_for(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidInput => code::INVALID_INPUT,
        ErrorKind::NotFound => code::NOT_FOUND,
        ErrorKind::InvalidTransition => code::INVALID_TRANSITION,
        ErrorKind::CapacityExceeded => code::CAPACITY_EXCEEDED,
        ErrorKind::ConcurrencyViolation => code::CONCURRENCY_VIOLATION,
        ErrorKind::Storage => code::DB_ERROR,
        ErrorKind::Internal => code::INTERNAL_ERROR,
    }
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code_for(err.kind()), err.to_string(), None::<()>)
}

pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}
