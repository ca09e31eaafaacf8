use serde::Deserialize;
use std::time::Duration;

use crate::shared::ValidationError;

/// What to poll and how often.
///
/// Each query takes the current watermark as its only parameter (`$1`) and must return the
/// `word`, `is_deleted` and `update_time` columns ordered by `update_time` ascending.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Query returning changes of the main dictionary.
    pub main_dictionary_query: String,
    /// Query returning changes of the stop word dictionary.
    pub stop_word_query: String,
    /// Seconds between two sync ticks.
    #[serde(default = "SyncConfig::default_interval_secs")]
    pub interval_secs: u64,
}

impl SyncConfig {
    const DEFAULT_INTERVAL_SECS: u64 = 60;

    fn default_interval_secs() -> u64 {
        Self::DEFAULT_INTERVAL_SECS
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.main_dictionary_query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery("main_dictionary_query"));
        }

        if self.stop_word_query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery("stop_word_query"));
        }

        if self.interval_secs == 0 {
            return Err(ValidationError::IntervalZero);
        }

        Ok(())
    }
}
