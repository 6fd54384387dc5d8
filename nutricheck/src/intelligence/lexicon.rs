use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{CheckError, Result};

/// Longest consumer phrase considered during normalization, in words.
pub const MAX_PHRASE_WORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LexiconEntry {
    pub standard_term: String,
    #[serde(default, alias = "CUI")]
    pub cui: String,
}

/// A phrase of the input mapped to its standard vocabulary term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPhrase {
    pub original: String,
    pub standard_term: String,
    pub cui: String,
}

/// Consumer health vocabulary lookup: lay phrases to standard terms.
#[derive(Debug, Clone, Default)]
pub struct TermLexicon {
    entries: HashMap<String, LexiconEntry>,
}

impl TermLexicon {
    /// Load a JSON object of `{"consumer phrase": {"standard_term", "cui"}}`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|e| {
            CheckError::Config(format!("Invalid lexicon {}: {e}", path.display()))
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, LexiconEntry> = serde_json::from_str(raw)?;
        Ok(Self::from_entries(parsed))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, LexiconEntry)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(phrase, entry)| (normalize_key(&phrase), entry))
            .filter(|(phrase, entry)| !phrase.is_empty() && !entry.standard_term.trim().is_empty())
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, phrase: &str) -> Option<&LexiconEntry> {
        self.entries.get(&normalize_key(phrase))
    }

    /// Normalize every phrase of `text`, longest phrases first.
    ///
    /// Each word is consumed by at most one phrase. Results are ordered by
    /// phrase length (longest first), then by position.
    pub fn normalize(&self, text: &str) -> Vec<NormalizedPhrase> {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
                    .to_lowercase()
            })
            .collect();
        let mut used = vec![false; words.len()];
        let mut results = Vec::new();

        for n in (1..=MAX_PHRASE_WORDS.min(words.len())).rev() {
            for i in 0..=words.len() - n {
                if used[i..i + n].iter().any(|u| *u) {
                    continue;
                }
                let phrase = words[i..i + n].join(" ");
                if let Some(entry) = self.entries.get(&phrase) {
                    results.push(NormalizedPhrase {
                        original: phrase,
                        standard_term: entry.standard_term.clone(),
                        cui: entry.cui.clone(),
                    });
                    used[i..i + n].iter_mut().for_each(|u| *u = true);
                }
            }
        }

        results
    }
}

fn normalize_key(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
