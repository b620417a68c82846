use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

/// Set of lowercase words disallowed in blend titles.
///
/// Membership is substring-based: a title is rejected when any stored word
/// occurs anywhere in it, case-insensitively. Loaded from the store at
/// startup and changed only through the admin endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModerationList {
    words: BTreeSet<String>,
}

impl ModerationList {
    /// Builds a list from raw words, lowercasing and trimming each entry.
    /// Empty entries are dropped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .filter_map(|w| normalize(w.as_ref()))
            .collect();
        Self { words }
    }

    /// Adds a word; returns false when it was already present or empty.
    pub fn insert(&mut self, word: &str) -> bool {
        match normalize(word) {
            Some(word) => self.words.insert(word),
            None => false,
        }
    }

    /// Removes a word; returns whether it was present.
    pub fn remove(&mut self, word: &str) -> bool {
        match normalize(word) {
            Some(word) => self.words.remove(&word),
            None => false,
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Scans a candidate title and fails on the first banned word it
    /// contains, reporting that word for user feedback.
    pub fn check(&self, title: &str) -> AppResult<()> {
        let candidate = title.to_lowercase();
        if let Some(word) = self.words.iter().find(|w| candidate.contains(w.as_str())) {
            return Err(AppError::ModerationRejected { word: word.clone() });
        }
        Ok(())
    }
}

fn normalize(word: &str) -> Option<String> {
    let word = word.trim().to_lowercase();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}
