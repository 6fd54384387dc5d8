use async_trait::async_trait;

use super::cache::{cached_complete, CompletionCache};
use super::lexicon::TermLexicon;
use crate::config::EnrichmentConfig;
use crate::error::Result;
use crate::llm::prompts::{term_expansion_prompt, TERM_EXPANSION_SYSTEM};
use crate::llm::{CompletionOptions, LlmProvider};
use crate::models::{EnrichedTerms, ExtractedClaim};

/// Terms longer than this are sentences, not search terms.
const MAX_TERM_WORDS: usize = 6;
const EXPANSION_MAX_TOKENS: u32 = 96;

/// Expands an extracted claim into synonyms and scientific terms.
#[async_trait]
pub trait TermEnricher: Send + Sync {
    async fn enrich(&self, extracted: &ExtractedClaim) -> Result<EnrichedTerms>;
}

/// Term enricher combining a biomedical language model with an optional
/// consumer health lexicon. Either source may be absent.
#[derive(Clone)]
pub struct LlmTermEnricher {
    provider: LlmProvider,
    lexicon: Option<TermLexicon>,
    cache: CompletionCache,
    max_terms: usize,
}

impl LlmTermEnricher {
    pub fn new(
        provider: LlmProvider,
        lexicon: Option<TermLexicon>,
        cache: CompletionCache,
        max_terms: usize,
    ) -> Self {
        Self {
            provider,
            lexicon,
            cache,
            max_terms,
        }
    }

    /// Build from the enrichment section, loading the lexicon file if one is
    /// configured.
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self> {
        let lexicon = config
            .lexicon_path
            .as_deref()
            .map(TermLexicon::from_path)
            .transpose()?;
        if let Some(lexicon) = &lexicon {
            tracing::info!(entries = lexicon.len(), "Term lexicon loaded");
        }

        Ok(Self::new(
            LlmProvider::new(config.llm.as_ref()),
            lexicon,
            CompletionCache::new(config.cache_size),
            config.max_terms,
        ))
    }

    async fn expand(&self, concept: &str) -> Vec<String> {
        if !self.provider.is_available() {
            return Vec::new();
        }

        let prompt = term_expansion_prompt(concept, self.max_terms);
        match cached_complete(
            &self.provider,
            &self.cache,
            TERM_EXPANSION_SYSTEM,
            &prompt,
            &CompletionOptions::deterministic(EXPANSION_MAX_TOKENS),
        )
        .await
        {
            Ok(completion) => parse_term_list(&completion, concept, self.max_terms),
            Err(e) => {
                tracing::warn!(concept, error = %e, "Term expansion failed, using lexicon terms only");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl TermEnricher for LlmTermEnricher {
    async fn enrich(&self, extracted: &ExtractedClaim) -> Result<EnrichedTerms> {
        let focus = extracted.effect_focus();
        let mut terms = EnrichedTerms::new();

        for concept in [extracted.subject.as_str(), focus.as_str()] {
            terms.extend(self.expand(concept).await);
        }

        if let Some(lexicon) = &self.lexicon {
            for text in [extracted.subject.as_str(), extracted.effect.as_str()] {
                terms.extend(lexicon.normalize(text).into_iter().map(|p| p.standard_term));
            }
        }

        // The subject and focus are searched anyway.
        let mut terms: EnrichedTerms = terms
            .iter()
            .filter(|t| {
                !t.eq_ignore_ascii_case(&extracted.subject) && !t.eq_ignore_ascii_case(&focus)
            })
            .collect();
        terms.truncate(self.max_terms);

        tracing::debug!(count = terms.len(), "Claim terms enriched");
        Ok(terms)
    }
}

/// Split a model completion into at most `max_terms` clean terms.
pub fn parse_term_list(completion: &str, concept: &str, max_terms: usize) -> Vec<String> {
    let mut terms = EnrichedTerms::new();

    for item in completion.split([',', ';', '\n']) {
        let term = clean_term(item);
        if term.is_empty()
            || term.split_whitespace().count() > MAX_TERM_WORDS
            || term.eq_ignore_ascii_case(concept.trim())
        {
            continue;
        }
        terms.push(term);
        if terms.len() >= max_terms {
            break;
        }
    }

    terms.iter().cloned().collect()
}

fn clean_term(item: &str) -> &str {
    let item = item.trim();
    // "1." and "2)" are list numbering; "25-hydroxy" is not.
    let digits = item.trim_start_matches(|c: char| c.is_ascii_digit());
    let item = if digits.len() < item.len() {
        digits
            .strip_prefix('.')
            .or_else(|| digits.strip_prefix(')'))
            .unwrap_or(item)
    } else {
        item
    };
    item.trim_start_matches(['-', '*', '•', ' '])
        .trim()
        .trim_matches(['"', '\'', '.'])
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    use crate::intelligence::lexicon::LexiconEntry;

    #[test]
    fn test_parse_comma_list() {
        let terms = parse_term_list(
            " cholecalciferol, ergocalciferol, 25-hydroxyvitamin D, calcitriol.",
            "vitamin D",
            8,
        );
        assert_eq!(
            terms,
            vec![
                "cholecalciferol",
                "ergocalciferol",
                "25-hydroxyvitamin D",
                "calcitriol"
            ]
        );
    }

    #[test]
    fn test_parse_numbered_and_bulleted_lines() {
        let terms = parse_term_list(
            "1. hydrocortisone\n2) glucocorticoid\n- HPA axis\n* stress hormone",
            "cortisol",
            8,
        );
        assert_eq!(
            terms,
            vec!["hydrocortisone", "glucocorticoid", "HPA axis", "stress hormone"]
        );
    }

    #[test]
    fn test_parse_drops_long_items_duplicates_and_concept() {
        let terms = parse_term_list(
            "Cortisol; hydrocortisone; HYDROCORTISONE; this is a long sentence rather than a term",
            "cortisol",
            8,
        );
        assert_eq!(terms, vec!["hydrocortisone"]);
    }

    #[test]
    fn test_parse_caps_terms() {
        let terms = parse_term_list("a1, b2, c3, d4, e5", "x", 3);
        assert_eq!(terms.len(), 3);
    }

    #[tokio::test]
    async fn test_lexicon_only_without_model() {
        let lexicon = TermLexicon::from_entries(HashMap::from([(
            "stress hormone".to_string(),
            LexiconEntry {
                standard_term: "hydrocortisone".to_string(),
                cui: "C0020268".to_string(),
            },
        )]));
        let enricher = LlmTermEnricher::new(
            LlmProvider::unavailable("not configured"),
            Some(lexicon),
            CompletionCache::disabled(),
            8,
        );

        let terms = enricher
            .enrich(&ExtractedClaim::new("Vitamin D", "lowers the stress hormone"))
            .await
            .unwrap();
        assert_eq!(terms.as_slice(), &["hydrocortisone"]);
    }

    #[tokio::test]
    async fn test_no_sources_yields_no_terms() {
        let enricher = LlmTermEnricher::new(
            LlmProvider::unavailable("not configured"),
            None,
            CompletionCache::disabled(),
            8,
        );
        let terms = enricher
            .enrich(&ExtractedClaim::new("Zinc", "shortens colds"))
            .await
            .unwrap();
        assert!(terms.is_empty());
    }
}
