use serde::Deserialize;
use std::time::Duration;

use crate::shared::ValidationError;

/// Sizing and wait policy of the source connection pool.
///
/// Acquisition waits at most `acquire_timeout_ms` before failing, which bounds every pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PoolConfig {
    /// Maximum number of open connections.
    #[serde(default = "PoolConfig::default_max_connections")]
    pub max_connections: u32,
    /// Number of idle connections the pool tries to keep open.
    #[serde(default = "PoolConfig::default_min_connections")]
    pub min_connections: u32,
    /// Maximum time, in milliseconds, to wait for a free connection.
    #[serde(default = "PoolConfig::default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl PoolConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 2;
    const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 6000;

    fn default_max_connections() -> u32 {
        Self::DEFAULT_MAX_CONNECTIONS
    }

    fn default_min_connections() -> u32 {
        Self::DEFAULT_MIN_CONNECTIONS
    }

    fn default_acquire_timeout_ms() -> u64 {
        Self::DEFAULT_ACQUIRE_TIMEOUT_MS
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_connections == 0 {
            return Err(ValidationError::MaxConnectionsZero);
        }

        if self.min_connections > self.max_connections {
            return Err(ValidationError::MinConnectionsExceedMax {
                min: self.min_connections,
                max: self.max_connections,
            });
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            min_connections: Self::DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_ms: Self::DEFAULT_ACQUIRE_TIMEOUT_MS,
        }
    }
}
