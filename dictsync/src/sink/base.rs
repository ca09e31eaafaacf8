use std::sync::Arc;

use crate::types::DictionaryKind;

/// Presence of a word in a dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordState {
    Active,
    Disabled,
}

/// The dictionary mutated by the syncer and read by the tokenizer.
///
/// Both operations are idempotent and infallible: adding an active word and disabling a disabled
/// or unknown word change nothing. Implementations do their own locking. The syncer applies every
/// row with one independent call and never holds the dictionary across a pass.
pub trait DictionarySink {
    /// Makes `word` active in the `kind` dictionary.
    fn add(&self, kind: DictionaryKind, word: &str);

    /// Makes `word` inactive in the `kind` dictionary.
    fn disable(&self, kind: DictionaryKind, word: &str);
}

impl<T> DictionarySink for Arc<T>
where
    T: DictionarySink + ?Sized,
{
    fn add(&self, kind: DictionaryKind, word: &str) {
        (**self).add(kind, word)
    }

    fn disable(&self, kind: DictionaryKind, word: &str) {
        (**self).disable(kind, word)
    }
}
