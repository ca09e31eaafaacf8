use std::error;
use std::fmt;

/// Result type of fallible sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Error raised while synchronizing a dictionary.
///
/// A [`SyncError`] carries an [`ErrorKind`] used to classify the failure, a static description
/// and optionally a dynamic detail such as the message of the underlying driver error.
#[derive(Debug, Clone)]
pub struct SyncError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
}

/// Categories of sync failures.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No connection could be obtained from the source pool.
    AcquisitionFailed,
    /// The change query could not be executed or was interrupted.
    QueryFailed,
    /// A returned row did not have the expected columns or column types.
    DecodeFailed,
    /// The source rejected the connection settings.
    ConfigError,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
        }
    }

    /// Returns the dynamic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::WithDescription(..) => None,
        }
    }
}

impl PartialEq for SyncError {
    fn eq(&self, other: &SyncError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::WithDescription(kind_a, _), ErrorRepr::WithDescription(kind_b, _)) => {
                kind_a == kind_b
            }
            (
                ErrorRepr::WithDescriptionAndDetail(kind_a, _, _),
                ErrorRepr::WithDescriptionAndDetail(kind_b, _, _),
            ) => kind_a == kind_b,
            _ => false,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => write!(f, "{kind:?}: {desc}"),
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                write!(f, "{kind:?}: {desc} -> {detail}")
            }
        }
    }
}

impl error::Error for SyncError {}

impl From<(ErrorKind, &'static str)> for SyncError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<(ErrorKind, &'static str, String)> for SyncError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> SyncError {
        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

/// Classifies a [`sqlx::Error`] raised while running a change query.
///
/// Row shape mismatches map to [`ErrorKind::DecodeFailed`], pool failures to
/// [`ErrorKind::AcquisitionFailed`] and everything else the server or the transport reports to
/// [`ErrorKind::QueryFailed`]. Errors raised while acquiring a connection should be mapped with
/// [`SyncError::acquisition`] instead, since an I/O failure there means no connection was
/// obtained.
impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> SyncError {
        let (kind, description) = match &err {
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => {
                (ErrorKind::DecodeFailed, "Change row could not be decoded")
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => (
                ErrorKind::AcquisitionFailed,
                "Source connection pool unavailable",
            ),
            sqlx::Error::Configuration(_) => {
                (ErrorKind::ConfigError, "Source connection misconfigured")
            }
            _ => (ErrorKind::QueryFailed, "Change query failed"),
        };

        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

impl SyncError {
    /// Maps an error raised while acquiring a source connection.
    pub fn acquisition(err: sqlx::Error) -> SyncError {
        let kind = match err {
            sqlx::Error::Configuration(_) => ErrorKind::ConfigError,
            _ => ErrorKind::AcquisitionFailed,
        };

        SyncError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                kind,
                "Failed to acquire a source connection",
                err.to_string(),
            ),
        }
    }
}
