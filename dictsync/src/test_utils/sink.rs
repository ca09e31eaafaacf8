use parking_lot::Mutex;
use std::sync::Arc;

use crate::sink::base::DictionarySink;
use crate::sink::memory::MemoryDictionary;
use crate::types::DictionaryKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Add(DictionaryKind, String),
    Disable(DictionaryKind, String),
}

/// A [`MemoryDictionary`] that also records every call made to it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    dictionary: MemoryDictionary,
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dictionary(&self) -> &MemoryDictionary {
        &self.dictionary
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }
}

impl DictionarySink for RecordingSink {
    fn add(&self, kind: DictionaryKind, word: &str) {
        self.calls.lock().push(SinkCall::Add(kind, word.to_string()));
        self.dictionary.add(kind, word);
    }

    fn disable(&self, kind: DictionaryKind, word: &str) {
        self.calls
            .lock()
            .push(SinkCall::Disable(kind, word.to_string()));
        self.dictionary.disable(kind, word);
    }
}
