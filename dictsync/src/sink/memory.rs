use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::sink::base::{DictionarySink, WordState};
use crate::types::DictionaryKind;

#[derive(Debug, Default)]
struct Inner {
    words: [HashMap<String, WordState>; DictionaryKind::COUNT],
}

/// In-memory dictionaries shared between the syncer and its readers.
///
/// Clones share the same words. Disabled words are kept as [`WordState::Disabled`] so readers
/// can tell them apart from words the source never mentioned. Entries are never removed, so
/// every distinct word the source disables, including words never added, stays in memory for
/// the life of the dictionary.
#[derive(Debug, Clone, Default)]
pub struct MemoryDictionary {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dictionary whose `kind` list starts with `words` active.
    pub fn with_words<I, W>(kind: DictionaryKind, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let dictionary = Self::new();
        {
            let mut inner = dictionary.inner.write();
            let entries = &mut inner.words[kind.index()];
            for word in words {
                entries.insert(word.into(), WordState::Active);
            }
        }

        dictionary
    }

    /// Returns the state of `word`, or [`None`] if the dictionary never saw it.
    pub fn state(&self, kind: DictionaryKind, word: &str) -> Option<WordState> {
        self.inner.read().words[kind.index()].get(word).copied()
    }

    pub fn is_active(&self, kind: DictionaryKind, word: &str) -> bool {
        self.state(kind, word) == Some(WordState::Active)
    }

    /// Returns the active words of `kind`, sorted.
    pub fn active_words(&self, kind: DictionaryKind) -> Vec<String> {
        let inner = self.inner.read();
        let mut words: Vec<String> = inner.words[kind.index()]
            .iter()
            .filter(|(_, state)| **state == WordState::Active)
            .map(|(word, _)| word.clone())
            .collect();
        words.sort_unstable();

        words
    }

    /// Number of active words of `kind`.
    pub fn len(&self, kind: DictionaryKind) -> usize {
        self.inner.read().words[kind.index()]
            .values()
            .filter(|state| **state == WordState::Active)
            .count()
    }

    pub fn is_empty(&self, kind: DictionaryKind) -> bool {
        self.len(kind) == 0
    }

    fn set(&self, kind: DictionaryKind, word: &str, state: WordState) {
        let mut inner = self.inner.write();
        let entries = &mut inner.words[kind.index()];
        match entries.get_mut(word) {
            Some(current) => *current = state,
            None => {
                entries.insert(word.to_owned(), state);
            }
        }
    }
}

impl DictionarySink for MemoryDictionary {
    fn add(&self, kind: DictionaryKind, word: &str) {
        self.set(kind, word, WordState::Active);
    }

    fn disable(&self, kind: DictionaryKind, word: &str) {
        self.set(kind, word, WordState::Disabled);
    }
}
