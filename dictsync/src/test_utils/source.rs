use futures::{Stream, StreamExt, stream};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify};

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::source::base::{ChangeConnection, ChangeSource};
use crate::source::fetcher::{ChangeFetcher, DictionaryQueries};
use crate::sync_error;
use crate::types::{ChangeRow, DictionaryKind, Watermark};

pub const TEST_MAIN_DICTIONARY_QUERY: &str =
    "select word, is_deleted, update_time from main_dictionary where update_time > $1 order by update_time";
pub const TEST_STOP_WORD_QUERY: &str =
    "select word, is_deleted, update_time from stop_word where update_time > $1 order by update_time";

/// Queries understood by [`TestChangeSource`].
pub fn test_queries() -> DictionaryQueries {
    DictionaryQueries {
        main_dictionary: TEST_MAIN_DICTIONARY_QUERY.to_string(),
        stop_word: TEST_STOP_WORD_QUERY.to_string(),
    }
}

pub fn test_fetcher() -> ChangeFetcher {
    ChangeFetcher::new(test_queries())
}

fn query_kind(query: &str) -> Option<DictionaryKind> {
    match query {
        TEST_MAIN_DICTIONARY_QUERY => Some(DictionaryKind::MainDictionary),
        TEST_STOP_WORD_QUERY => Some(DictionaryKind::StopWordDictionary),
        _ => None,
    }
}

/// Holds fetches of a kind until released.
#[derive(Debug, Clone)]
pub struct FetchGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl FetchGate {
    /// Waits until a fetch reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the fetch waiting at the gate continue.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Debug, Default)]
struct Inner {
    acquire_failures: VecDeque<SyncError>,
    fetches: HashMap<DictionaryKind, VecDeque<Vec<SyncResult<ChangeRow>>>>,
    fetch_params: HashMap<DictionaryKind, Vec<Watermark>>,
    gates: HashMap<DictionaryKind, FetchGate>,
}

/// A [`ChangeSource`] replaying scripted fetches.
///
/// Every fetch of a kind pops the next scripted batch of that kind, or returns no rows when none
/// is left. Acquisitions and releases are counted so tests can check that every connection is
/// given back exactly once.
#[derive(Debug, Clone, Default)]
pub struct TestChangeSource {
    inner: Arc<Mutex<Inner>>,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl TestChangeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a fetch of `kind` returning `rows`.
    pub async fn push_rows(&self, kind: DictionaryKind, rows: Vec<ChangeRow>) {
        self.push_fetch(kind, rows.into_iter().map(Ok).collect())
            .await;
    }

    /// Scripts a fetch of `kind` yielding `items`, errors included.
    pub async fn push_fetch(&self, kind: DictionaryKind, items: Vec<SyncResult<ChangeRow>>) {
        let mut inner = self.inner.lock().await;
        inner.fetches.entry(kind).or_default().push_back(items);
    }

    /// Makes the next acquisition fail with `err`.
    pub async fn fail_next_acquire(&self, err: SyncError) {
        let mut inner = self.inner.lock().await;
        inner.acquire_failures.push_back(err);
    }

    /// Makes every following fetch of `kind` wait at the returned gate.
    pub async fn gate_fetches(&self, kind: DictionaryKind) -> FetchGate {
        let gate = FetchGate {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        let mut inner = self.inner.lock().await;
        inner.gates.insert(kind, gate.clone());

        gate
    }

    /// Watermarks bound to the fetches of `kind`, in order.
    pub async fn fetch_params(&self, kind: DictionaryKind) -> Vec<Watermark> {
        let inner = self.inner.lock().await;
        inner.fetch_params.get(&kind).cloned().unwrap_or_default()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ChangeSource for TestChangeSource {
    type Connection = TestConnection;

    async fn acquire(&self) -> SyncResult<Self::Connection> {
        if let Some(err) = self.inner.lock().await.acquire_failures.pop_front() {
            return Err(err);
        }

        self.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(TestConnection {
            inner: self.inner.clone(),
            released: self.released.clone(),
        })
    }
}

/// Connection handed out by [`TestChangeSource`]; counts itself as released on drop.
#[derive(Debug)]
pub struct TestConnection {
    inner: Arc<Mutex<Inner>>,
    released: Arc<AtomicUsize>,
}

impl Drop for TestConnection {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChangeConnection for TestConnection {
    fn fetch_changes<'a>(
        &'a mut self,
        query: &'a str,
        since: Watermark,
    ) -> impl Stream<Item = SyncResult<ChangeRow>> + Send + 'a {
        let inner = self.inner.clone();

        stream::once(async move {
            let Some(kind) = query_kind(query) else {
                return vec![Err(sync_error!(
                    ErrorKind::QueryFailed,
                    "Unknown test query",
                    query
                ))];
            };

            let (gate, items) = {
                let mut inner = inner.lock().await;
                inner.fetch_params.entry(kind).or_default().push(since);
                let gate = inner.gates.get(&kind).cloned();
                let items = inner
                    .fetches
                    .get_mut(&kind)
                    .and_then(|fetches| fetches.pop_front())
                    .unwrap_or_default();
                (gate, items)
            };

            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }

            items
        })
        .flat_map(stream::iter)
    }
}
