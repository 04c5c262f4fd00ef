//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC parameters onto `QueueService`.

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    BusinessStatsRequest, CallNextResponse, CreateQueueRequest, EntryRequest, JoinRequest,
    PositionRequest, QueueRequest, ResetResponse, SetStatusRequest, UpdateQueueRequest,
};
use ezyq_core::application::{MaintenanceScheduler, QueueService};
use ezyq_core::domain::{BusinessStats, Position, Queue, QueueEntry, QueueStats};
use ezyq_core::port::MaintenanceStats;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    service: Arc<QueueService>,
    maintenance: Arc<MaintenanceScheduler>,
    rate_limiter: RateLimiter,
}

impl RpcHandler {
    pub fn new(
        service: Arc<QueueService>,
        maintenance: Arc<MaintenanceScheduler>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            service,
            maintenance,
            rate_limiter,
        }
    }

    /// Mutating methods spend a token first
    fn throttle(&self) -> RpcResult<()> {
        if self.rate_limiter.check() {
            Ok(())
        } else {
            Err(throttled())
        }
    }

    /// queue.create.v1
    pub async fn create_queue(&self, params: CreateQueueRequest) -> RpcResult<Queue> {
        self.throttle()?;
        self.service
            .admin()
            .create_queue(params)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.get.v1
    pub async fn get_queue(&self, params: QueueRequest) -> RpcResult<Queue> {
        self.service
            .admin()
            .get_queue(&params.queue_id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.update.v1
    pub async fn update_queue(&self, params: UpdateQueueRequest) -> RpcResult<Queue> {
        self.throttle()?;
        self.service
            .admin()
            .update_queue(&params.queue_id, &params.update)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.status.v1
    pub async fn set_status(&self, params: SetStatusRequest) -> RpcResult<Queue> {
        self.throttle()?;
        self.service
            .admin()
            .set_status(&params.queue_id, params.status)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.reset.v1
    pub async fn reset_queue(&self, params: QueueRequest) -> RpcResult<ResetResponse> {
        self.throttle()?;
        let (queue, removed_entries) = self
            .service
            .admin()
            .reset_queue(&params.queue_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(ResetResponse {
            queue,
            removed_entries,
        })
    }

    /// queue.join.v1
    pub async fn join(&self, params: JoinRequest) -> RpcResult<QueueEntry> {
        self.throttle()?;
        self.service.join_queue(params).await.map_err(to_rpc_error)
    }

    /// queue.position.v1
    pub async fn position(&self, params: PositionRequest) -> RpcResult<Position> {
        self.service
            .get_position(&params.queue_id, &params.user_id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.call_next.v1
    pub async fn call_next(&self, params: QueueRequest) -> RpcResult<CallNextResponse> {
        self.throttle()?;
        let entry = self
            .service
            .call_next(&params.queue_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(CallNextResponse { entry })
    }

    /// entry.cancel.v1
    pub async fn cancel(&self, params: EntryRequest) -> RpcResult<QueueEntry> {
        self.throttle()?;
        self.service
            .cancel_entry(&params.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// entry.complete.v1
    pub async fn complete(&self, params: EntryRequest) -> RpcResult<QueueEntry> {
        self.throttle()?;
        self.service
            .complete_entry(&params.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// entry.no_show.v1
    pub async fn no_show(&self, params: EntryRequest) -> RpcResult<QueueEntry> {
        self.throttle()?;
        self.service
            .mark_no_show(&params.entry_id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.stats.v1
    pub async fn queue_stats(&self, params: QueueRequest) -> RpcResult<QueueStats> {
        self.service
            .queue_stats(&params.queue_id)
            .await
            .map_err(to_rpc_error)
    }

    /// business.stats.v1
    pub async fn business_stats(&self, params: BusinessStatsRequest) -> RpcResult<BusinessStats> {
        self.service
            .business_stats(&params.business_id)
            .await
            .map_err(to_rpc_error)
    }

    /// admin.maintenance.v1
    pub async fn maintenance(&self) -> RpcResult<MaintenanceStats> {
        self.throttle()?;
        self.maintenance.run_now().await.map_err(to_rpc_error)
    }
}
