//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over TCP, bound to localhost by default.

use crate::handler::RpcHandler;
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::types::{
    BusinessStatsRequest, CreateQueueRequest, EntryRequest, JoinRequest, PositionRequest,
    QueueRequest, SetStatusRequest, UpdateQueueRequest,
};
use ezyq_core::application::{MaintenanceScheduler, QueueService};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9627;

/// Every method the server exposes
pub const METHODS: [&str; 14] = [
    "queue.create.v1",
    "queue.get.v1",
    "queue.update.v1",
    "queue.status.v1",
    "queue.reset.v1",
    "queue.join.v1",
    "queue.position.v1",
    "queue.call_next.v1",
    "entry.cancel.v1",
    "entry.complete.v1",
    "entry.no_show.v1",
    "queue.stats.v1",
    "business.stats.v1",
    "admin.maintenance.v1",
];

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
    pub rate_limit: RateLimitConfig,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Register `$method` so that it parses its named params into `$req` and
/// forwards them to `RpcHandler::$call`
macro_rules! register {
    ($module:expr, $handler:expr, $method:literal, $req:ty, $call:ident) => {{
        let handler = $handler.clone();
        $module
            .register_async_method($method, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: $req = params.parse()?;
                    handler.$call(req).await
                }
            })
            .map_err(|e| e.to_string())?;
    }};
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        service: Arc<QueueService>,
        maintenance: Arc<MaintenanceScheduler>,
    ) -> Self {
        let rate_limiter = RateLimiter::from_config(config.rate_limit);
        Self {
            handler: Arc::new(RpcHandler::new(service, maintenance, rate_limiter)),
            config,
        }
    }

    /// Method table
    pub fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());
        let handler = &self.handler;

        // Queue management
        register!(module, handler, "queue.create.v1", CreateQueueRequest, create_queue);
        register!(module, handler, "queue.get.v1", QueueRequest, get_queue);
        register!(module, handler, "queue.update.v1", UpdateQueueRequest, update_queue);
        register!(module, handler, "queue.status.v1", SetStatusRequest, set_status);
        register!(module, handler, "queue.reset.v1", QueueRequest, reset_queue);

        // Entry lifecycle
        register!(module, handler, "queue.join.v1", JoinRequest, join);
        register!(module, handler, "queue.position.v1", PositionRequest, position);
        register!(module, handler, "queue.call_next.v1", QueueRequest, call_next);
        register!(module, handler, "entry.cancel.v1", EntryRequest, cancel);
        register!(module, handler, "entry.complete.v1", EntryRequest, complete);
        register!(module, handler, "entry.no_show.v1", EntryRequest, no_show);

        // Statistics
        register!(module, handler, "queue.stats.v1", QueueRequest, queue_stats);
        register!(module, handler, "business.stats.v1", BusinessStatsRequest, business_stats);

        // Admin (no params)
        let maintenance_handler = handler.clone();
        module
            .register_async_method("admin.maintenance.v1", move |_, _, _| {
                let handler = maintenance_handler.clone();
                async move { handler.maintenance().await }
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Bind and start serving. The returned handle stops the server when
    /// `stop()` is called.
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            burst = self.config.rate_limit.burst,
            rate_per_sec = self.config.rate_limit.rate_per_sec,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let module = self.module()?;
        let handle = server.start(module);

        info!(methods = METHODS.len(), "JSON-RPC server started");
        Ok(handle)
    }
}
