//! Keyed storage for the taker's answers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// In-memory mapping from question index to the taker's current answer.
///
/// This is a plain container: it does not check answers against the
/// question kind, and an absent key means the question is unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    answers: BTreeMap<usize, String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the answer at `index`.
    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        self.answers.insert(index, value.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answers.contains_key(&index)
    }

    /// Number of answered questions.
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.answers.iter().map(|(i, v)| (*i, v.as_str()))
    }

    /// An immutable copy for scoring; later writes to the store do not affect it.
    pub fn snapshot(&self) -> AnswerSnapshot {
        AnswerSnapshot {
            answers: self.answers.clone(),
        }
    }
}

/// Frozen copy of an `AnswerStore`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSnapshot {
    answers: BTreeMap<usize, String>,
}

impl AnswerSnapshot {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for AnswerSnapshot {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().map(|(i, v)| (i, v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_creates_and_overwrites() {
        let mut store = AnswerStore::new();
        assert!(store.get(0).is_none());

        store.set(0, "A");
        store.set(2, "C");
        assert_eq!(store.get(0), Some("A"));
        assert_eq!(store.len(), 2);

        store.set(0, "B");
        assert_eq!(store.get(0), Some("B"));
        assert_eq!(store.len(), 2);
        assert!(!store.is_answered(1));
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let mut store = AnswerStore::new();
        store.set(0, "A");
        let snapshot = store.snapshot();

        store.set(0, "changed");
        store.set(1, "new");

        assert_eq!(snapshot.get(0), Some("A"));
        assert!(snapshot.get(1).is_none());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn empty_strings_count_as_answers() {
        let mut store = AnswerStore::new();
        store.set(3, "");
        assert!(store.is_answered(3));
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![(3, "")]);
    }
}
