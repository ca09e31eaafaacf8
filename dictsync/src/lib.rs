//! Incremental synchronization of tokenizer dictionaries from a relational source.
//!
//! A [`syncer::DictionarySyncer`] polls the source for rows changed since the last observed
//! watermark, applies them to a [`sink::DictionarySink`] and advances the
//! [`watermark::WatermarkStore`] once a whole batch went through. A
//! [`scheduler::SyncScheduler`] drives it periodically.

pub mod concurrency;
pub mod error;
mod macros;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod syncer;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod watermark;
