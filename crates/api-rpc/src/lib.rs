//! JSON-RPC API Layer
//!
//! JSON-RPC 2.0 server exposing the ezyQ queue engine.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use server::{RpcServer, RpcServerConfig, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT, METHODS};
