use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Function words ignored when comparing vocabularies.
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "between", "both", "but", "by", "can", "could", "did", "do", "does", "during", "each", "for",
    "from", "had", "has", "have", "in", "into", "is", "it", "its", "may", "more", "most", "of",
    "on", "or", "our", "over", "such", "than", "that", "the", "their", "these", "this", "those",
    "to", "was", "we", "were", "which", "while", "who", "will", "with", "within",
];

/// Lowercased words of `text`, in order.
pub fn words(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// Lowercased words that carry meaning: no stopwords, no single characters
/// except digits and qualifiers.
///
/// A short token right after a kept word is a qualifier of that word and is
/// kept even when it is a single letter: "vitamin D", "omega 3", "vitamin B12".
/// Lowercase "a" only qualifies when written uppercase ("Vitamin A").
pub fn content_words(text: &str) -> Vec<String> {
    let mut kept = Vec::new();
    let mut after_head = false;

    for raw in text.unicode_words() {
        let word = raw.to_lowercase();
        let qualifier = after_head && is_qualifier(&word) && raw != "a";
        let meaningful = !STOPWORDS.contains(&word.as_str())
            && (word.chars().count() > 1 || word.chars().all(|c| c.is_ascii_digit()));

        if qualifier || meaningful {
            after_head = !is_qualifier(&word);
            kept.push(word);
        } else {
            after_head = false;
        }
    }

    kept
}

/// Single characters and short tokens carrying a digit ("d", "3", "b12", "d3").
pub fn is_qualifier(word: &str) -> bool {
    let len = word.chars().count();
    len == 1 || (len <= 3 && word.chars().any(|c| c.is_ascii_digit()))
}

/// Words match when equal, or when one is a prefix of the other and the
/// shorter has at least 4 characters ("reduce" / "reduced", "sugar" / "sugars").
pub fn fuzzy_word_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let min_len = a.chars().count().min(b.chars().count());
    if min_len < 4 {
        return false;
    }
    a.starts_with(b) || b.starts_with(a)
}

/// Index of text words for repeated concept lookups.
#[derive(Debug, Default)]
pub struct WordIndex {
    exact: HashSet<String>,
    all: Vec<String>,
}

impl WordIndex {
    pub fn new(text: &str) -> Self {
        let all = words(text);
        let exact = all.iter().cloned().collect();
        Self { exact, all }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.exact.contains(word) || self.all.iter().any(|w| fuzzy_word_match(w, word))
    }

    /// A concept is found when every one of its content words is present.
    /// Qualifiers must directly follow the word they qualify, so "vitamin d"
    /// is not found in "vitamin C ... day 3, d".
    pub fn contains_concept(&self, concept_words: &[String]) -> bool {
        if concept_words.is_empty() {
            return false;
        }
        concept_words.iter().enumerate().all(|(i, word)| {
            if i > 0 && is_qualifier(word) {
                self.contains_pair(&concept_words[i - 1], word)
            } else {
                self.contains(word)
            }
        })
    }

    fn contains_pair(&self, head: &str, qualifier: &str) -> bool {
        self.all
            .windows(2)
            .any(|pair| pair[1] == qualifier && fuzzy_word_match(&pair[0], head))
    }

    /// Share of `words` present in the index, in `[0, 1]`.
    pub fn overlap(&self, words: &HashSet<String>) -> f32 {
        if words.is_empty() {
            return 0.0;
        }
        let found = words.iter().filter(|w| self.contains(w)).count();
        found as f32 / words.len() as f32
    }
}
