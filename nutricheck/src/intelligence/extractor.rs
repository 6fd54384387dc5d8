use async_trait::async_trait;
use serde_json::Value;

use super::cache::{cached_complete, CompletionCache};
use crate::error::{CheckError, Result};
use crate::llm::prompts::{claim_extraction_prompt, CLAIM_EXTRACTION_SYSTEM};
use crate::llm::{CompletionOptions, LlmProvider};
use crate::models::ExtractedClaim;

const EXTRACTION_MAX_TOKENS: u32 = 128;

/// Turns free-text claims into a `(subject, effect)` pair.
#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    async fn extract(&self, claim: &str) -> Result<ExtractedClaim>;
}

/// Claim extractor backed by an OpenAI-compatible chat model.
#[derive(Clone)]
pub struct LlmClaimExtractor {
    provider: LlmProvider,
    cache: CompletionCache,
}

impl LlmClaimExtractor {
    pub fn new(provider: LlmProvider, cache: CompletionCache) -> Self {
        Self { provider, cache }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}

#[async_trait]
impl ClaimExtractor for LlmClaimExtractor {
    async fn extract(&self, claim: &str) -> Result<ExtractedClaim> {
        if claim.trim().is_empty() {
            return Err(CheckError::ExtractionFailed("claim is empty".to_string()));
        }

        let completion = cached_complete(
            &self.provider,
            &self.cache,
            CLAIM_EXTRACTION_SYSTEM,
            &claim_extraction_prompt(claim.trim()),
            &CompletionOptions::deterministic(EXTRACTION_MAX_TOKENS),
        )
        .await
        .map_err(|e| match e {
            CheckError::LlmUnavailable(_) | CheckError::Timeout(_) => e,
            other => CheckError::ExtractionFailed(format!("model call failed: {other}")),
        })?;

        let extracted = parse_extraction(&completion)?;
        tracing::debug!(
            subject = %extracted.subject,
            effect = %extracted.effect,
            "Claim extracted"
        );
        Ok(extracted)
    }
}

/// Parse a model completion into an extracted claim.
///
/// Accepts a JSON object with `subject` and `effect` (or `object`), optionally
/// wrapped in a code fence or surrounded by prose, or `subject:` / `effect:`
/// lines. `null`, empty fields and anything else fail.
pub fn parse_extraction(completion: &str) -> Result<ExtractedClaim> {
    let text = strip_code_fence(completion.trim());

    if text.is_empty() || text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("none") {
        return Err(CheckError::ExtractionFailed(
            "model found no claim in the text".to_string(),
        ));
    }

    let json = serde_json::from_str::<Value>(text).ok().or_else(|| {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        (start < end)
            .then(|| serde_json::from_str::<Value>(&text[start..=end]).ok())
            .flatten()
    });

    let extracted = match json {
        Some(Value::Object(map)) => {
            let field = |names: &[&str]| {
                names
                    .iter()
                    .find_map(|name| map.get(*name).and_then(Value::as_str))
                    .unwrap_or_default()
                    .to_string()
            };
            ExtractedClaim::new(field(&["subject"]), field(&["effect", "object"]))
        }
        Some(Value::Null) => {
            return Err(CheckError::ExtractionFailed(
                "model found no claim in the text".to_string(),
            ))
        }
        _ => parse_labelled_lines(text),
    };

    if extracted.is_complete() {
        Ok(extracted)
    } else {
        Err(CheckError::ExtractionFailed(format!(
            "could not read subject and effect from model output: {}",
            preview(completion)
        )))
    }
}

fn parse_labelled_lines(text: &str) -> ExtractedClaim {
    let mut subject = String::new();
    let mut effect = String::new();

    for line in text.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim();
        match label
            .trim()
            .trim_start_matches(['-', '*'])
            .trim()
            .to_lowercase()
            .as_str()
        {
            "subject" if subject.is_empty() => subject = value.to_string(),
            "effect" | "object" if effect.is_empty() => effect = value.to_string(),
            _ => {}
        }
    }

    ExtractedClaim::new(subject, effect)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_json_object() {
        let extracted =
            parse_extraction(r#"{"subject": "Vitamin D", "effect": "lowers cortisol"}"#).unwrap();
        assert_eq!(extracted, ExtractedClaim::new("Vitamin D", "lowers cortisol"));
    }

    #[test]
    fn test_parse_object_alias_and_fence() {
        let extracted = parse_extraction(
            "```json\n{\"subject\": \"green tea\", \"object\": \"weight loss\"}\n```",
        )
        .unwrap();
        assert_eq!(extracted.subject, "green tea");
        assert_eq!(extracted.effect, "weight loss");
    }

    #[test]
    fn test_parse_json_inside_prose() {
        let extracted = parse_extraction(
            "Sure! Here it is: {\"subject\": \"zinc\", \"effect\": \"shortens colds\"} Hope that helps.",
        )
        .unwrap();
        assert_eq!(extracted.subject, "zinc");
    }

    #[test]
    fn test_parse_labelled_lines() {
        let extracted = parse_extraction("Subject: coffee\nEffect: raises blood pressure").unwrap();
        assert_eq!(
            extracted,
            ExtractedClaim::new("coffee", "raises blood pressure")
        );
    }

    #[test]
    fn test_null_and_malformed_fail() {
        for output in ["null", "", "  NULL ", "I cannot help with that.", r#"{"subject": "salt"}"#] {
            let err = parse_extraction(output).unwrap_err();
            assert!(
                matches!(err, CheckError::ExtractionFailed(_)),
                "expected ExtractionFailed for {output:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_blank_claim_fails_without_model() {
        let extractor = LlmClaimExtractor::new(
            LlmProvider::unavailable("not configured"),
            CompletionCache::disabled(),
        );
        let err = extractor.extract("   ").await.unwrap_err();
        assert!(matches!(err, CheckError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_unavailable_model_is_reported() {
        let extractor = LlmClaimExtractor::new(
            LlmProvider::unavailable("not configured"),
            CompletionCache::disabled(),
        );
        let err = extractor.extract("Coffee causes cancer").await.unwrap_err();
        assert!(matches!(err, CheckError::LlmUnavailable(_)));
    }
}
