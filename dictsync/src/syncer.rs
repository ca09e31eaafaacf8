use futures::StreamExt;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::sink::base::DictionarySink;
use crate::source::base::ChangeSource;
use crate::source::fetcher::ChangeFetcher;
use crate::types::{ChangeRow, DictionaryKind, Watermark};
use crate::watermark::WatermarkStore;

/// Summary of a pass that consumed its whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub kind: DictionaryKind,
    /// Rows applied with [`DictionarySink::add`].
    pub added: u64,
    /// Rows applied with [`DictionarySink::disable`].
    pub disabled: u64,
    /// Rows ignored because their word was blank.
    pub skipped_empty: u64,
    pub watermark_before: Watermark,
    pub watermark_after: Watermark,
    pub duration: Duration,
}

impl PassReport {
    pub fn applied(&self) -> u64 {
        self.added + self.disabled
    }
}

/// How a pass ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The batch was applied and the watermark advanced to its latest change.
    Completed(PassReport),
    /// Another pass of the same kind was running, so this one did not start.
    Skipped,
    /// The pass stopped at an error and left the watermark untouched.
    Failed(SyncError),
}

/// Running flags of the dictionary kinds.
///
/// A kind is running while a permit of its single-permit semaphore is held. The permit is
/// returned when the guard drops, whichever way the pass ends.
#[derive(Debug)]
struct PassGuards {
    running: [Semaphore; DictionaryKind::COUNT],
}

impl PassGuards {
    fn new() -> Self {
        Self {
            running: [Semaphore::new(1), Semaphore::new(1)],
        }
    }

    fn try_enter(&self, kind: DictionaryKind) -> Option<SemaphorePermit<'_>> {
        self.running[kind.index()].try_acquire().ok()
    }

    fn is_running(&self, kind: DictionaryKind) -> bool {
        self.running[kind.index()].available_permits() == 0
    }
}

/// Counters and highest change time of the rows applied so far in a pass.
#[derive(Debug, Default)]
struct PassProgress {
    added: u64,
    disabled: u64,
    skipped_empty: u64,
    highest_applied: Option<Watermark>,
}

impl PassProgress {
    fn apply<K>(&mut self, sink: &K, kind: DictionaryKind, row: &ChangeRow)
    where
        K: DictionarySink,
    {
        let Some(word) = row.trimmed_word() else {
            self.skipped_empty += 1;
            return;
        };

        if row.is_deleted {
            sink.disable(kind, word);
            self.disabled += 1;
        } else {
            sink.add(kind, word);
            self.added += 1;
        }

        self.highest_applied = Some(match self.highest_applied {
            Some(highest) => highest.max(row.changed_at),
            None => row.changed_at,
        });
    }
}

/// Keeps the dictionaries of a [`DictionarySink`] in line with a [`ChangeSource`].
///
/// Each pass fetches the rows of one kind changed since the kind's watermark, applies them in
/// order and only then advances the watermark. A failing pass leaves the watermark where it was,
/// so the next pass fetches the same rows again. Rows of a failed batch that were already applied
/// are applied a second time, which the sink's idempotency makes harmless.
///
/// At most one pass per kind runs at a time; passes of different kinds run independently and
/// each acquires its own connection. Clones share watermarks and running flags.
#[derive(Debug)]
pub struct DictionarySyncer<S, K> {
    source: S,
    sink: K,
    fetcher: Arc<ChangeFetcher>,
    watermarks: WatermarkStore,
    guards: Arc<PassGuards>,
}

impl<S, K> Clone for DictionarySyncer<S, K>
where
    S: Clone,
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            sink: self.sink.clone(),
            fetcher: self.fetcher.clone(),
            watermarks: self.watermarks.clone(),
            guards: self.guards.clone(),
        }
    }
}

impl<S, K> DictionarySyncer<S, K>
where
    S: ChangeSource + Sync,
    K: DictionarySink + Sync,
{
    pub fn new(source: S, sink: K, fetcher: ChangeFetcher, watermarks: WatermarkStore) -> Self {
        Self {
            source,
            sink,
            fetcher: Arc::new(fetcher),
            watermarks,
            guards: Arc::new(PassGuards::new()),
        }
    }

    pub fn watermarks(&self) -> &WatermarkStore {
        &self.watermarks
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Returns `true` while a pass of `kind` is in flight.
    pub fn is_running(&self, kind: DictionaryKind) -> bool {
        self.guards.is_running(kind)
    }

    /// Runs one pass for every dictionary kind, concurrently.
    ///
    /// Outcomes are reported through tracing only; a failing pass never fails the tick.
    pub async fn run_tick(&self) {
        let [main, stop_word] = DictionaryKind::ALL;
        tokio::join!(self.run_pass(main), self.run_pass(stop_word));
    }

    /// Runs a single pass for `kind` and logs its outcome.
    ///
    /// Returns [`PassOutcome::Skipped`] without touching the source when a pass of `kind` is
    /// already running.
    pub async fn run_pass(&self, kind: DictionaryKind) -> PassOutcome {
        let Some(_running) = self.guards.try_enter(kind) else {
            warn!(%kind, "previous pass is still running, dropping this one");
            return PassOutcome::Skipped;
        };

        info!(%kind, "starting dictionary pass");
        let started = Instant::now();

        match self.sync_kind(kind, started).await {
            Ok(report) => {
                info!(
                    %kind,
                    added_count = report.added,
                    disabled_count = report.disabled,
                    skipped_count = report.skipped_empty,
                    duration_ms = report.duration.as_millis() as u64,
                    watermark = %report.watermark_after,
                    "dictionary pass completed"
                );
                PassOutcome::Completed(report)
            }
            Err(err) => {
                error!(
                    %kind,
                    error_kind = ?err.kind(),
                    message = %err,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "dictionary pass failed"
                );
                PassOutcome::Failed(err)
            }
        }
    }

    async fn sync_kind(&self, kind: DictionaryKind, started: Instant) -> SyncResult<PassReport> {
        let mut connection = self.source.acquire().await?;
        let watermark_before = self.watermarks.get(kind);

        let progress = self
            .apply_changes(&mut connection, kind, watermark_before)
            .await;
        drop(connection);
        let progress = progress?;

        if let Some(highest) = progress.highest_applied {
            self.watermarks.advance(kind, highest);
        }

        Ok(PassReport {
            kind,
            added: progress.added,
            disabled: progress.disabled,
            skipped_empty: progress.skipped_empty,
            watermark_before,
            watermark_after: self.watermarks.get(kind),
            duration: started.elapsed(),
        })
    }

    async fn apply_changes(
        &self,
        connection: &mut S::Connection,
        kind: DictionaryKind,
        since: Watermark,
    ) -> SyncResult<PassProgress> {
        let mut changes = pin!(self.fetcher.fetch(connection, kind, since));
        let mut progress = PassProgress::default();

        while let Some(row) = changes.next().await {
            progress.apply(&self.sink, kind, &row?);
        }

        Ok(progress)
    }
}
