use chrono::{DateTime, NaiveDateTime, Utc};
use dictsync_config::shared::{IntoConnectOptions, PgConnectionConfig, PoolConfig};
use futures::{Stream, StreamExt};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Postgres, Row, TypeInfo};

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::source::base::{ChangeConnection, ChangeSource};
use crate::sync_error;
use crate::types::{ChangeRow, Watermark};

/// Column holding the word.
const WORD_COLUMN: &str = "word";
/// Column telling whether the word was removed.
const IS_DELETED_COLUMN: &str = "is_deleted";
/// Column holding the time of the change.
const UPDATE_TIME_COLUMN: &str = "update_time";

/// Builds the pool used to reach the dictionary tables.
///
/// The pool connects lazily, so an unreachable database surfaces as acquisition failures of the
/// individual passes instead of preventing startup.
pub fn connect_source_pool(source: &PgConnectionConfig, pool: &PoolConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(pool.acquire_timeout())
        .connect_lazy_with(source.with_db())
}

/// [`ChangeSource`] backed by a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgChangeSource {
    pool: PgPool,
}

impl PgChangeSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ChangeSource for PgChangeSource {
    type Connection = PgChangeConnection;

    async fn acquire(&self) -> SyncResult<Self::Connection> {
        let connection = self.pool.acquire().await.map_err(SyncError::acquisition)?;

        Ok(PgChangeConnection { connection })
    }
}

/// A pooled connection, returned to the pool on drop.
#[derive(Debug)]
pub struct PgChangeConnection {
    connection: PoolConnection<Postgres>,
}

impl ChangeConnection for PgChangeConnection {
    fn fetch_changes<'a>(
        &'a mut self,
        query: &'a str,
        since: Watermark,
    ) -> impl Stream<Item = SyncResult<ChangeRow>> + Send + 'a {
        sqlx::query(query)
            .bind(since)
            .fetch(&mut *self.connection)
            .map(|row| decode_change_row(&row?))
    }
}

/// Decodes the `word`, `is_deleted` and `update_time` columns of a change row.
///
/// A `NULL` word decodes as an empty word, which the syncer skips. `is_deleted` may be a boolean
/// or an integer flag, `update_time` a `timestamp` or a `timestamptz`.
fn decode_change_row(row: &PgRow) -> SyncResult<ChangeRow> {
    let word: Option<String> = row.try_get(WORD_COLUMN)?;
    let is_deleted = decode_flag(row, IS_DELETED_COLUMN)?;
    let changed_at = decode_timestamp(row, UPDATE_TIME_COLUMN)?;

    Ok(ChangeRow::new(word.unwrap_or_default(), is_deleted, changed_at))
}

fn decode_flag(row: &PgRow, column: &str) -> SyncResult<bool> {
    match column_type(row, column)? {
        "BOOL" => Ok(row.try_get::<bool, _>(column)?),
        "INT2" => Ok(row.try_get::<i16, _>(column)? != 0),
        "INT4" => Ok(row.try_get::<i32, _>(column)? != 0),
        "INT8" => Ok(row.try_get::<i64, _>(column)? != 0),
        other => Err(unsupported_type(column, other)),
    }
}

fn decode_timestamp(row: &PgRow, column: &str) -> SyncResult<NaiveDateTime> {
    match column_type(row, column)? {
        "TIMESTAMP" => Ok(row.try_get::<NaiveDateTime, _>(column)?),
        "TIMESTAMPTZ" => Ok(row.try_get::<DateTime<Utc>, _>(column)?.naive_utc()),
        other => Err(unsupported_type(column, other)),
    }
}

fn column_type<'r>(row: &'r PgRow, column: &str) -> SyncResult<&'r str> {
    Ok(row.try_column(column)?.type_info().name())
}

fn unsupported_type(column: &str, type_name: &str) -> SyncError {
    sync_error!(
        ErrorKind::DecodeFailed,
        "Change column has an unsupported type",
        format!("column `{column}` has type {type_name}")
    )
}
