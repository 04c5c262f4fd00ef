// Maintenance Service
// Periodic purge of old terminal entries and DB compaction

use crate::error::Result;
use crate::port::{Maintenance, MaintenanceConfig, MaintenanceStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Maintenance scheduler
///
/// Runs the full maintenance pass in the background every `interval_hours`
pub struct MaintenanceScheduler {
    maintenance: Arc<dyn Maintenance>,
    config: MaintenanceConfig,
    interval_hours: u64,
}

impl MaintenanceScheduler {
    /// # Arguments
    /// * `maintenance` - Maintenance implementation
    /// * `config` - Retention and VACUUM thresholds
    /// * `interval_hours` - How often to run (hours, at least 1)
    pub fn new(
        maintenance: Arc<dyn Maintenance>,
        config: MaintenanceConfig,
        interval_hours: u64,
    ) -> Self {
        Self {
            maintenance,
            config,
            interval_hours: interval_hours.max(1),
        }
    }

    /// Maintenance loop. Spawn with `tokio::spawn`; the first pass runs immediately.
    pub async fn run(self) {
        info!(
            interval_hours = self.interval_hours,
            retention_days = self.config.terminal_entry_retention_days,
            "Maintenance scheduler started"
        );

        let mut tick = interval(Duration::from_secs(self.interval_hours * 3600));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tick.tick().await;

            match self.maintenance.run_full_maintenance(&self.config).await {
                Ok(stats) => {
                    info!(
                        db_size_mb = stats.db_size_mb,
                        queues = stats.queue_count,
                        entries = stats.entry_count,
                        history = stats.history_count,
                        "Scheduled maintenance completed"
                    );
                }
                Err(e) => {
                    error!(error = ?e, "Scheduled maintenance failed");
                }
            }
        }
    }

    /// Run maintenance immediately (manual trigger)
    pub async fn run_now(&self) -> Result<MaintenanceStats> {
        info!("Running manual maintenance");
        let stats = self.maintenance.run_full_maintenance(&self.config).await?;
        info!(
            db_size_mb = stats.db_size_mb,
            terminal_entries = stats.terminal_entry_count,
            "Manual maintenance completed"
        );
        Ok(stats)
    }
}
