use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// A dictionary query is empty.
    #[error("`{0}` cannot be empty")]
    EmptyQuery(&'static str),
    /// The sync interval is zero.
    #[error("`interval_secs` must be greater than zero")]
    IntervalZero,
    /// The pool allows no connections.
    #[error("`max_connections` must be greater than zero")]
    MaxConnectionsZero,
    /// The pool keeps more idle connections than it may open.
    #[error("`min_connections` ({min}) cannot exceed `max_connections` ({max})")]
    MinConnectionsExceedMax { min: u32, max: u32 },
}
