use serde::Deserialize;

use crate::shared::{PgConnectionConfig, PoolConfig, SyncConfig, ValidationError};

/// Configuration of the sync daemon.
///
/// Deserialized once at startup from the layered configuration sources.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncerConfig {
    /// Database holding the dictionary tables.
    pub source: PgConnectionConfig,
    /// Connection pool settings for `source`.
    #[serde(default)]
    pub pool: PoolConfig,
    /// Queries and polling interval.
    pub sync: SyncConfig,
}

impl SyncerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.pool.validate()?;
        self.sync.validate()?;

        Ok(())
    }
}
