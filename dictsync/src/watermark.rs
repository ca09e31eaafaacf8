use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::{DictionaryKind, SENTINEL_WATERMARK, Watermark};

/// Per-kind watermarks of the changes applied so far.
///
/// Every kind starts at [`SENTINEL_WATERMARK`]. Watermarks only move forward and live as long as
/// the process, so a restart replays the source from the sentinel. Clones share the same
/// watermarks.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    inner: Arc<RwLock<[Watermark; DictionaryKind::COUNT]>>,
}

impl WatermarkStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new([SENTINEL_WATERMARK; DictionaryKind::COUNT])),
        }
    }

    /// Returns the watermark of `kind`.
    pub fn get(&self, kind: DictionaryKind) -> Watermark {
        self.inner.read()[kind.index()]
    }

    /// Moves the watermark of `kind` to `value` unless it is already later.
    ///
    /// Returns `true` if the stored watermark changed.
    pub fn advance(&self, kind: DictionaryKind, value: Watermark) -> bool {
        let mut watermarks = self.inner.write();
        let current = &mut watermarks[kind.index()];
        if value > *current {
            *current = value;
            return true;
        }

        false
    }
}

impl Default for WatermarkStore {
    fn default() -> Self {
        Self::new()
    }
}
