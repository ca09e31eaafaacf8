use dictsync::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use dictsync::scheduler::SyncScheduler;
use dictsync::sink::memory::MemoryDictionary;
use dictsync::source::fetcher::{ChangeFetcher, DictionaryQueries};
use dictsync::source::postgres::{PgChangeSource, connect_source_pool};
use dictsync::syncer::DictionarySyncer;
use dictsync::types::DictionaryKind;
use dictsync::watermark::WatermarkStore;
use dictsync_config::shared::{PgConnectionConfig, PoolConfig, SyncConfig, SyncerConfig};
use tracing::{info, warn};

use crate::config::load_syncer_config;

pub async fn start_syncer() -> anyhow::Result<()> {
    info!("starting dictionary sync service");
    let config = load_syncer_config()?;

    log_config(&config);

    let pool = connect_source_pool(&config.source, &config.pool);
    let source = PgChangeSource::new(pool.clone());
    let dictionary = MemoryDictionary::new();
    let fetcher = ChangeFetcher::new(DictionaryQueries::from(&config.sync));
    let syncer = DictionarySyncer::new(
        source,
        dictionary.clone(),
        fetcher,
        WatermarkStore::new(),
    );

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let scheduler = SyncScheduler::new(syncer, config.sync.interval(), shutdown_rx);

    let shutdown_handle = tokio::spawn(wait_for_shutdown_signal(shutdown_tx));

    scheduler.run().await;

    // The scheduler only returns after a shutdown signal, but abort the listener in case it
    // stopped for another reason.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    pool.close().await;

    for kind in DictionaryKind::ALL {
        info!(%kind, active_words = dictionary.len(kind), "final dictionary size");
    }
    info!("dictionary sync service completed");

    Ok(())
}

async fn wait_for_shutdown_signal(shutdown_tx: ShutdownTx) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            warn!(error = %err, "failed to register SIGTERM handler, listening for SIGINT only");
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("SIGINT (Ctrl+C) received, shutting down");
            }
            send_shutdown(&shutdown_tx);
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT (Ctrl+C) received, shutting down");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down");
        }
    }

    send_shutdown(&shutdown_tx);
}

fn send_shutdown(shutdown_tx: &ShutdownTx) {
    if let Err(err) = shutdown_tx.shutdown() {
        warn!("failed to send shutdown signal: {:?}", err);
    }
}

fn log_config(config: &SyncerConfig) {
    log_source_config(&config.source);
    log_pool_config(&config.pool);
    log_sync_config(&config.sync);
}

fn log_source_config(config: &PgConnectionConfig) {
    info!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "source postgres connection config",
    );
}

fn log_pool_config(config: &PoolConfig) {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_ms = config.acquire_timeout_ms,
        "source pool config"
    );
}

fn log_sync_config(config: &SyncConfig) {
    info!(
        interval_secs = config.interval_secs,
        main_dictionary_query = config.main_dictionary_query,
        stop_word_query = config.stop_word_query,
        "sync config"
    );
}
