use futures::Stream;
use std::future::Future;

use crate::error::SyncResult;
use crate::types::{ChangeRow, Watermark};

/// Hands out connections to the database holding the dictionary tables.
///
/// A connection is released when the returned handle is dropped, so every exit path of a pass
/// gives it back exactly once.
pub trait ChangeSource {
    type Connection: ChangeConnection + Send;

    /// Acquires a connection, waiting at most as long as the source's wait policy allows.
    ///
    /// Fails with [`crate::error::ErrorKind::AcquisitionFailed`] when no connection can be
    /// obtained.
    fn acquire(&self) -> impl Future<Output = SyncResult<Self::Connection>> + Send;
}

/// A connection able to run change queries.
pub trait ChangeConnection {
    /// Runs `query` with `since` bound as its only parameter and streams the decoded rows in the
    /// order the query returns them.
    ///
    /// The stream ends at the first error: [`crate::error::ErrorKind::QueryFailed`] if the query
    /// fails, [`crate::error::ErrorKind::DecodeFailed`] if a row lacks a column or has an
    /// unexpected column type.
    fn fetch_changes<'a>(
        &'a mut self,
        query: &'a str,
        since: Watermark,
    ) -> impl Stream<Item = SyncResult<ChangeRow>> + Send + 'a;
}
