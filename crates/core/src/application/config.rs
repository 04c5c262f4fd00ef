// Engine tunables

use crate::domain::{DomainError, Priority, MILLIS_PER_MINUTE};

const MILLIS_PER_DAY: i64 = 24 * 60 * MILLIS_PER_MINUTE;

/// Engine configuration (defaults match the production app)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Trailing window for the average wait statistic (days)
    pub stats_window_days: i64,

    /// Trailing window for popular queue ranking (days)
    pub popularity_window_days: i64,

    pub min_priority: Priority,
    pub max_priority: Priority,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stats_window_days: 7,
            popularity_window_days: 7,
            min_priority: -100,
            max_priority: 100,
        }
    }
}

impl EngineConfig {
    pub fn stats_window_millis(&self) -> i64 {
        self.stats_window_days * MILLIS_PER_DAY
    }

    pub fn popularity_window_millis(&self) -> i64 {
        self.popularity_window_days * MILLIS_PER_DAY
    }

    pub fn validate_priority(&self, priority: Priority) -> Result<(), DomainError> {
        if priority < self.min_priority || priority > self.max_priority {
            return Err(DomainError::InvalidInput(format!(
                "Priority {} out of range [{}, {}]",
                priority, self.min_priority, self.max_priority
            )));
        }
        Ok(())
    }
}
