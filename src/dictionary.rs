//! English-word membership and lemmatization behind an injected capability.
//!
//! The candidate filter, the filename excision and the isolation merger all
//! ask the same two questions: "is this a real English word?" and "what is its
//! base form?". Both are answered through the `Dictionary` trait so the
//! extraction pipeline can run against a small fixture word list in tests and
//! a full word list in production.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::extraction::text::remove_punctuation;

pub trait Dictionary: Send + Sync {
    /// Exact membership of the given string in the word list.
    fn contains(&self, word: &str) -> bool;

    /// Base form of an already lower-cased, punctuation-free word: singular
    /// noun form first, then verb base form.
    fn lemma(&self, word: &str) -> String;
}

/// Strip punctuation, lower-case, and reduce to the base form.
pub fn base_form(word: &str, dict: &dyn Dictionary) -> String {
    let word = remove_punctuation(word, "").to_lowercase();
    dict.lemma(&word)
}

/// True when the base form of `word` is in the dictionary.
pub fn is_base_word(word: &str, dict: &dyn Dictionary) -> bool {
    dict.contains(&base_form(word, dict))
}

/// A plain-text word list, one word per line.
///
/// Lemmatization is membership-guided: a suffix-stripped candidate is only
/// accepted when the word list knows it, otherwise the input is returned
/// unchanged.
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read word list {}; the extraction pipeline needs it",
                path.display()
            )
        })?;
        Ok(Self::from_words(content.lines()))
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        WordList { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn known(&self, candidate: &str) -> bool {
        self.words.contains(candidate)
    }

    fn singular(&self, word: &str) -> Option<String> {
        if let Some(stem) = word.strip_suffix("ies") {
            if word.len() > 4 {
                let candidate = format!("{}y", stem);
                if self.known(&candidate) {
                    return Some(candidate);
                }
            }
        }
        if let Some(stem) = word.strip_suffix("es") {
            if self.known(stem) {
                return Some(stem.to_string());
            }
        }
        if let Some(stem) = word.strip_suffix('s') {
            if !word.ends_with("ss") && self.known(stem) {
                return Some(stem.to_string());
            }
        }
        None
    }

    fn verb_base(&self, word: &str) -> Option<String> {
        if let Some(stem) = word.strip_suffix("ing") {
            if word.len() > 5 {
                if self.known(stem) {
                    return Some(stem.to_string());
                }
                let candidate = format!("{}e", stem);
                if self.known(&candidate) {
                    return Some(candidate);
                }
            }
        }
        if let Some(stem) = word.strip_suffix("ied") {
            let candidate = format!("{}y", stem);
            if self.known(&candidate) {
                return Some(candidate);
            }
        }
        if let Some(stem) = word.strip_suffix("ed") {
            if word.len() > 4 {
                if self.known(stem) {
                    return Some(stem.to_string());
                }
                let candidate = format!("{}e", stem);
                if self.known(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl Dictionary for WordList {
    fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    fn lemma(&self, word: &str) -> String {
        let noun = self.singular(word).unwrap_or_else(|| word.to_string());
        self.verb_base(&noun).unwrap_or(noun)
    }
}

#[cfg(test)]
pub(crate) fn fixture() -> WordList {
    WordList::from_words([
        "a", "and", "award", "by", "contract", "file", "flash", "force", "from", "government",
        "grant", "invention", "issue", "made", "number", "of", "office", "program", "project",
        "research", "rights", "support", "the", "this", "under", "was", "with", "work",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lemma_reduces_plurals_and_verb_forms() {
        let dict = fixture();
        assert_eq!(dict.lemma("grants"), "grant");
        assert_eq!(dict.lemma("issued"), "issue");
        assert_eq!(dict.lemma("numbers"), "number");
        // Unknown stems pass through unchanged.
        assert_eq!(dict.lemma("fg02"), "fg02");
    }

    #[test]
    fn base_form_strips_punctuation_and_case() {
        let dict = fixture();
        assert_eq!(base_form("Grants,", &dict), "grant");
        assert!(is_base_word("Supported", &dict));
        assert!(!is_base_word("FG02", &dict));
    }

    #[test]
    fn membership_is_exact() {
        let dict = fixture();
        assert!(dict.contains("and"));
        assert!(!dict.contains("And"));
        assert!(!dict.contains("67890,"));
    }
}
