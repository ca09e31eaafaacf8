use dictsync_config::load_config;
use dictsync_config::shared::SyncerConfig;

/// Loads the [`SyncerConfig`] and validates it.
pub fn load_syncer_config() -> anyhow::Result<SyncerConfig> {
    let config = load_config::<SyncerConfig>()?;
    config.validate()?;

    Ok(config)
}
