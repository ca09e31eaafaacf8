use dictsync_config::shared::SyncConfig;
use futures::Stream;
use tracing::debug;

use crate::error::SyncResult;
use crate::source::base::ChangeConnection;
use crate::types::{ChangeRow, DictionaryKind, Watermark};

/// The "changes since watermark" query of each dictionary kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryQueries {
    pub main_dictionary: String,
    pub stop_word: String,
}

impl DictionaryQueries {
    pub fn for_kind(&self, kind: DictionaryKind) -> &str {
        match kind {
            DictionaryKind::MainDictionary => &self.main_dictionary,
            DictionaryKind::StopWordDictionary => &self.stop_word,
        }
    }
}

impl From<&SyncConfig> for DictionaryQueries {
    fn from(config: &SyncConfig) -> Self {
        Self {
            main_dictionary: config.main_dictionary_query.clone(),
            stop_word: config.stop_word_query.clone(),
        }
    }
}

/// Fetches the changes of a dictionary kind newer than a watermark.
#[derive(Debug, Clone)]
pub struct ChangeFetcher {
    queries: DictionaryQueries,
}

impl ChangeFetcher {
    pub fn new(queries: DictionaryQueries) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &DictionaryQueries {
        &self.queries
    }

    /// Streams the changes of `kind` made after `since` over `connection`.
    ///
    /// `since` is bound once when the query starts; the stream borrows the connection until it
    /// is dropped.
    pub fn fetch<'a, C>(
        &'a self,
        connection: &'a mut C,
        kind: DictionaryKind,
        since: Watermark,
    ) -> impl Stream<Item = SyncResult<ChangeRow>> + Send + 'a
    where
        C: ChangeConnection,
    {
        debug!(%kind, %since, "fetching dictionary changes");

        connection.fetch_changes(self.queries.for_kind(kind), since)
    }
}
