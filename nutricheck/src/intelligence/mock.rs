//! Fixed-answer extractor and enricher for offline runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;

use super::{ClaimExtractor, TermEnricher};
use crate::error::{CheckError, Result};
use crate::models::{EnrichedTerms, ExtractedClaim};

/// Answers from a table of known claims, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct FixedClaimExtractor {
    claims: HashMap<String, ExtractedClaim>,
}

impl FixedClaimExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claim(mut self, claim: &str, extracted: ExtractedClaim) -> Self {
        self.claims.insert(claim.trim().to_lowercase(), extracted);
        self
    }
}

#[async_trait]
impl ClaimExtractor for FixedClaimExtractor {
    async fn extract(&self, claim: &str) -> Result<ExtractedClaim> {
        if claim.trim().is_empty() {
            return Err(CheckError::ExtractionFailed("claim is empty".to_string()));
        }
        self.claims
            .get(&claim.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| CheckError::ExtractionFailed(format!("unknown claim: {claim}")))
    }
}

/// Returns the same terms for every claim.
#[derive(Debug, Clone, Default)]
pub struct FixedTermEnricher {
    terms: EnrichedTerms,
}

impl FixedTermEnricher {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms.into_iter().collect(),
        }
    }
}

#[async_trait]
impl TermEnricher for FixedTermEnricher {
    async fn enrich(&self, _extracted: &ExtractedClaim) -> Result<EnrichedTerms> {
        Ok(self.terms.clone())
    }
}
