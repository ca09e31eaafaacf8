//! Shorthand for building [`crate::error::SyncError`]s.

/// Creates a [`crate::error::SyncError`] from a kind, a static description and an optional
/// detail.
#[macro_export]
macro_rules! sync_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::SyncError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::SyncError::from(($kind, $desc, $detail.to_string()))
    };
}

