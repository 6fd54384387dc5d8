use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Verbs that state the direction of an effect. Matched on whole words,
/// multi-word phrases first.
const DECREASE_VERBS: &[&str] = &[
    "brings down",
    "cuts down",
    "decreases",
    "decrease",
    "lowers",
    "lower",
    "reduces",
    "reduce",
    "lessens",
    "suppresses",
    "inhibits",
    "prevents",
    "prevent",
    "cuts",
    "drops",
    "relieves",
    "fights",
    "blocks",
    "eases",
];

const INCREASE_VERBS: &[&str] = &[
    "increases",
    "increase",
    "raises",
    "raise",
    "boosts",
    "boost",
    "elevates",
    "enhances",
    "improves",
    "improve",
    "promotes",
    "stimulates",
    "strengthens",
    "supports",
    "causes",
    "cause",
    "leads to",
    "triggers",
];

/// Direction asserted by the effect of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectDirection {
    Increase,
    Decrease,
    #[default]
    Unspecified,
}

/// The `(subject, effect)` pair extracted from a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedClaim {
    pub subject: String,
    pub effect: String,
}

impl ExtractedClaim {
    pub fn new(subject: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            subject: subject.into().trim().to_string(),
            effect: effect.into().trim().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.subject.trim().is_empty() && !self.effect.trim().is_empty()
    }

    /// The effect with its leading direction verb removed, e.g. `"lowers cortisol"`
    /// becomes `"cortisol"`. Falls back to the whole effect when nothing is left.
    pub fn effect_focus(&self) -> String {
        let lower = self.effect.to_lowercase();
        for verb in DECREASE_VERBS.iter().chain(INCREASE_VERBS.iter()) {
            if let Some(rest) = strip_leading_phrase(&lower, verb) {
                let start = self.effect.len().saturating_sub(rest.len());
                let focus = self.effect.get(start..).unwrap_or(rest).trim();
                if !focus.is_empty() {
                    return focus.to_string();
                }
            }
        }
        self.effect.trim().to_string()
    }

    pub fn direction(&self) -> EffectDirection {
        let lower = self.effect.to_lowercase();
        if DECREASE_VERBS
            .iter()
            .any(|verb| strip_leading_phrase(&lower, verb).is_some())
        {
            EffectDirection::Decrease
        } else if INCREASE_VERBS
            .iter()
            .any(|verb| strip_leading_phrase(&lower, verb).is_some())
        {
            EffectDirection::Increase
        } else {
            EffectDirection::Unspecified
        }
    }
}

/// Returns the text after `phrase` when `text` starts with it as whole words.
fn strip_leading_phrase<'a>(text: &'a str, phrase: &str) -> Option<&'a str> {
    let trimmed = text.trim_start();
    let rest = trimmed.strip_prefix(phrase)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// Ordered, case-insensitively deduplicated list of search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EnrichedTerms(Vec<String>);

impl EnrichedTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term unless it is blank or already present (ignoring case).
    /// Returns whether the term was added.
    pub fn push(&mut self, term: impl AsRef<str>) -> bool {
        let term = term.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        if term.is_empty() || self.contains(&term) {
            return false;
        }
        self.0.push(term);
        true
    }

    pub fn contains(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        self.0.iter().any(|t| t.to_lowercase() == needle)
    }

    pub fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            self.push(term);
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for EnrichedTerms {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut terms = Self::new();
        terms.extend(iter);
        terms
    }
}

impl<'a> IntoIterator for &'a EnrichedTerms {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
