use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Point in time up to which the changes of a dictionary have been applied.
pub type Watermark = NaiveDateTime;

/// Watermark used before any change of a dictionary has been observed: `2020-01-01T00:00:00`.
pub const SENTINEL_WATERMARK: Watermark = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(date) => date.and_time(NaiveTime::MIN),
    None => panic!("sentinel watermark date is invalid"),
};

/// The word lists kept in sync with the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DictionaryKind {
    /// Vocabulary used to segment text.
    MainDictionary,
    /// Words dropped from the token stream.
    StopWordDictionary,
}

impl DictionaryKind {
    /// Number of dictionary kinds.
    pub const COUNT: usize = 2;

    /// Every kind, in the order a tick starts their passes.
    pub const ALL: [DictionaryKind; Self::COUNT] = [
        DictionaryKind::MainDictionary,
        DictionaryKind::StopWordDictionary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DictionaryKind::MainDictionary => "main_dictionary",
            DictionaryKind::StopWordDictionary => "stop_word_dictionary",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            DictionaryKind::MainDictionary => 0,
            DictionaryKind::StopWordDictionary => 1,
        }
    }
}

impl fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change of one word, as read from the source table.
///
/// Words are stored as read. Use [`ChangeRow::trimmed_word`] to get the word that is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRow {
    pub word: String,
    pub is_deleted: bool,
    pub changed_at: NaiveDateTime,
}

impl ChangeRow {
    pub fn new(word: impl Into<String>, is_deleted: bool, changed_at: NaiveDateTime) -> Self {
        Self {
            word: word.into(),
            is_deleted,
            changed_at,
        }
    }

    /// Returns the word without surrounding whitespace, or [`None`] if nothing is left.
    pub fn trimmed_word(&self) -> Option<&str> {
        let word = self.word.trim();
        (!word.is_empty()).then_some(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_start_of_2020() {
        assert_eq!(SENTINEL_WATERMARK.to_string(), "2020-01-01 00:00:00");
    }

    #[test]
    fn blank_words_trim_to_none() {
        let at = SENTINEL_WATERMARK;

        assert_eq!(ChangeRow::new("  hello\t", false, at).trimmed_word(), Some("hello"));
        assert_eq!(ChangeRow::new(" \n ", false, at).trimmed_word(), None);
        assert_eq!(ChangeRow::new("", true, at).trimmed_word(), None);
    }
}
