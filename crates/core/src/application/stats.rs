// Rolling queue statistics

use crate::application::capacity::CapacityTracker;
use crate::application::config::EngineConfig;
use crate::domain::{BusinessId, BusinessStats, EntryStatus, PopularQueue, QueueId, QueueStats};
use crate::error::{AppError, Result};
use crate::port::{Repositories, TimeProvider};
use std::sync::Arc;
use tracing::debug;

/// Derives statistics from history plus live counters. Lock-free reads.
pub struct QueueStatsAggregator {
    repos: Repositories,
    clock: Arc<dyn TimeProvider>,
    config: EngineConfig,
}

impl QueueStatsAggregator {
    pub fn new(repos: Repositories, clock: Arc<dyn TimeProvider>, config: EngineConfig) -> Self {
        Self {
            repos,
            clock,
            config,
        }
    }

    /// Waiting count, trailing average wait, total served and utilization.
    ///
    /// The average falls back to the queue's avg_service_time when nothing
    /// completed inside the window.
    pub async fn stats(&self, queue_id: &QueueId) -> Result<QueueStats> {
        let queue = self
            .repos
            .queues
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| AppError::queue_not_found(queue_id))?;

        let since = self.clock.now_millis() - self.config.stats_window_millis();
        let waiting_count = self
            .repos
            .entries
            .count_by_status(queue_id, EntryStatus::Waiting)
            .await?;
        let avg_wait_minutes = match self.repos.history.average_wait_since(queue_id, since).await? {
            Some(mean) => mean.round() as i64,
            None => queue.avg_service_time as i64,
        };
        let total_served = self.repos.history.count_for_queue(queue_id).await?;

        let stats = QueueStats {
            queue_id: queue_id.clone(),
            waiting_count,
            avg_wait_minutes,
            total_served,
            utilization_percent: CapacityTracker::utilization(&queue),
        };
        debug!(queue_id = %queue_id, waiting = waiting_count, "Queue stats computed");
        Ok(stats)
    }

    /// Totals across a business's queues. Customers are distinct served users.
    pub async fn business_stats(&self, business_id: &BusinessId) -> Result<BusinessStats> {
        let (total_queues, active_queues) =
            self.repos.queues.count_for_business(business_id).await?;
        let (total_served, total_customers) =
            self.repos.history.served_for_business(business_id).await?;

        Ok(BusinessStats {
            business_id: business_id.clone(),
            total_queues,
            active_queues,
            total_customers,
            total_served,
        })
    }

    /// Active queues ranked by joins inside the popularity window
    pub async fn popular(&self, limit: i64) -> Result<Vec<PopularQueue>> {
        let since = self.clock.now_millis() - self.config.popularity_window_millis();
        self.repos.queues.find_popular(since, limit).await
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        self.repos.queues.categories().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Queue, QueueDraft, QueueEntry, QueueHistory, MILLIS_PER_MINUTE};
    use crate::port::mocks::{InMemoryQueueStore, ManualClock};
    use crate::port::{QueueRepository, TransactionalQueueStore};

    const DAY: i64 = 24 * 60 * MILLIS_PER_MINUTE;

    fn queue(id: &str, business: &str, category: Option<&str>, created_at: i64) -> Queue {
        Queue::new(
            id,
            created_at,
            QueueDraft {
                business_id: business.to_string(),
                name: id.to_string(),
                category: category.map(str::to_string),
                max_capacity: Some(4),
                avg_service_time: Some(9),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn record(entry: &str, queue: &str, user: &str, wait: i64, completed_at: i64) -> QueueHistory {
        QueueHistory {
            entry_id: entry.to_string(),
            queue_id: queue.to_string(),
            user_id: user.to_string(),
            ticket_number: 1,
            wait_time: wait,
            service_time: 1,
            status: EntryStatus::Served,
            joined_at: 0,
            completed_at,
            rating: None,
            feedback: None,
        }
    }

    async fn fixture() -> (Arc<InMemoryQueueStore>, Arc<ManualClock>, QueueStatsAggregator) {
        let store = Arc::new(InMemoryQueueStore::new());
        let clock = Arc::new(ManualClock::new(30 * DAY));
        let aggregator = QueueStatsAggregator::new(
            Repositories::from_store(store.clone()),
            clock.clone(),
            EngineConfig::default(),
        );
        (store, clock, aggregator)
    }

    #[tokio::test]
    async fn test_stats_fall_back_to_service_time() {
        let (store, _clock, aggregator) = fixture().await;
        store.insert_queue(&queue("q1", "biz", None, 0)).await.unwrap();

        // Only an old record, outside the window
        store.seed_history(record("old", "q1", "u0", 40, DAY)).await;

        let stats = aggregator.stats(&"q1".to_string()).await.unwrap();
        assert_eq!(stats.avg_wait_minutes, 9);
        assert_eq!(stats.total_served, 1);
        assert_eq!(stats.waiting_count, 0);
        assert_eq!(stats.utilization_percent, 0);
    }

    #[tokio::test]
    async fn test_stats_average_and_utilization() {
        let (store, clock, aggregator) = fixture().await;
        let mut q = queue("q1", "biz", None, 0);
        q.current_capacity = 1;
        store.insert_queue(&q).await.unwrap();

        let now = clock.now_millis();
        store.seed_history(record("a", "q1", "u1", 4, now - DAY)).await;
        store.seed_history(record("b", "q1", "u2", 7, now - 2 * DAY)).await;

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert_entry(&QueueEntry::new("e1", "q1", "u3", 1, 0, now))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let stats = aggregator.stats(&"q1".to_string()).await.unwrap();
        assert_eq!(stats.avg_wait_minutes, 6); // 5.5 rounds up
        assert_eq!(stats.total_served, 2);
        assert_eq!(stats.waiting_count, 1);
        assert_eq!(stats.utilization_percent, 25);
    }

    #[tokio::test]
    async fn test_business_stats_count_distinct_customers() {
        let (store, _clock, aggregator) = fixture().await;
        store.insert_queue(&queue("q1", "biz", None, 0)).await.unwrap();
        store.insert_queue(&queue("q2", "biz", None, 0)).await.unwrap();
        store.insert_queue(&queue("q3", "other", None, 0)).await.unwrap();
        store
            .bulk_update_status(&["q2".to_string()], crate::domain::QueueStatus::Closed, 1)
            .await
            .unwrap();

        store.seed_history(record("a", "q1", "u1", 1, 1)).await;
        store.seed_history(record("b", "q2", "u1", 1, 2)).await;
        store.seed_history(record("c", "q2", "u2", 1, 3)).await;
        store.seed_history(record("d", "q3", "u9", 1, 4)).await;

        let stats = aggregator.business_stats(&"biz".to_string()).await.unwrap();
        assert_eq!(stats.total_queues, 2);
        assert_eq!(stats.active_queues, 1);
        assert_eq!(stats.total_served, 3);
        assert_eq!(stats.total_customers, 2);
    }

    #[tokio::test]
    async fn test_popular_and_categories() {
        let (store, clock, aggregator) = fixture().await;
        store
            .insert_queue(&queue("quiet", "biz", Some("food"), 1))
            .await
            .unwrap();
        store
            .insert_queue(&queue("busy", "biz", Some("health"), 2))
            .await
            .unwrap();

        let now = clock.now_millis();
        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert_entry(&QueueEntry::new("e1", "busy", "u1", 1, 0, now))
            .await
            .unwrap();
        tx.insert_entry(&QueueEntry::new("e2", "busy", "u2", 2, 0, now))
            .await
            .unwrap();
        // Outside the window
        tx.insert_entry(&QueueEntry::new("e3", "quiet", "u3", 1, 0, now - 8 * DAY))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let popular = aggregator.popular(10).await.unwrap();
        assert_eq!(popular[0].queue.id, "busy");
        assert_eq!(popular[0].entry_count, 2);
        assert_eq!(popular[1].entry_count, 0);

        assert_eq!(aggregator.categories().await.unwrap(), vec!["food", "health"]);
    }

    #[tokio::test]
    async fn test_unknown_queue() {
        let (_store, _clock, aggregator) = fixture().await;
        assert!(aggregator.stats(&"none".to_string()).await.is_err());
    }
}
