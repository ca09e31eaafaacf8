use dictsync_telemetry::init_tracing;

use crate::core::start_syncer;

mod config;
mod core;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_name = env!("CARGO_BIN_NAME");

    let _log_flusher = init_tracing(app_name)?;

    start_syncer().await?;

    Ok(())
}
