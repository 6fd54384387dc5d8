use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{EvidenceSet, Verdict, VerdictLabel};

/// Rating scale of the published `ClaimReview`: 1 refuted, 2 inconclusive,
/// 3 supported.
const WORST_RATING: u8 = 1;
const BEST_RATING: u8 = 3;

/// A content-addressed JSON-LD document describing one verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeAsset {
    document: Value,
    content_hash: String,
    digest: String,
}

impl KnowledgeAsset {
    /// Build the schema.org `ClaimReview` for a verdict and the evidence it
    /// was drawn from. The `@id` is the SHA-256 of the document without it.
    pub fn from_verdict(verdict: &Verdict, evidence: &EvidenceSet) -> Result<Self> {
        let cited: Vec<Value> = verdict
            .cited_evidence
            .iter()
            .map(|record| {
                json!({
                    "@type": "ScholarlyArticle",
                    "identifier": format!("pmid:{}", record.id),
                    "headline": record.title,
                    "author": record.authors,
                    "datePublished": record.publication_date,
                    "isPartOf": record.journal,
                    "url": record.url,
                })
            })
            .collect();

        let mut document = json!({
            "@context": "https://schema.org",
            "@type": "ClaimReview",
            "claimReviewed": format!("{} {}", verdict.claim.subject, verdict.claim.effect),
            "about": {
                "subject": verdict.claim.subject,
                "effect": verdict.claim.effect,
            },
            "reviewRating": {
                "@type": "Rating",
                "ratingValue": rating_value(verdict.label),
                "worstRating": WORST_RATING,
                "bestRating": BEST_RATING,
                "alternateName": verdict.label.to_string(),
                "ratingExplanation": format!(
                    "{} supporting, {} refuting, {} neutral of {} retrieved articles",
                    verdict.supporting,
                    verdict.refuting,
                    verdict.neutral,
                    evidence.len()
                ),
            },
            "confidence": verdict.confidence,
            "truthScore": verdict.truth_score,
            "searchQuery": evidence.query,
            "citation": cited,
        });

        let bytes = serde_json::to_vec(&document)?;
        let hash = Sha256::digest(&bytes);
        let content_hash = format!("{hash:x}");
        let digest = STANDARD.encode(hash);

        if let Value::Object(map) = &mut document {
            map.insert(
                "@id".to_string(),
                Value::String(format!("urn:sha256:{content_hash}")),
            );
        }

        Ok(Self {
            document,
            content_hash,
            digest,
        })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Lowercase hex SHA-256 of the document body.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Value for an RFC 3230 `Digest` header.
    pub fn digest_header(&self) -> String {
        format!("SHA-256={}", self.digest)
    }
}

fn rating_value(label: VerdictLabel) -> u8 {
    match label {
        VerdictLabel::Refuted => 1,
        VerdictLabel::Inconclusive => 2,
        VerdictLabel::Supported => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvidenceRecord, ExtractedClaim};

    fn supported_verdict() -> (Verdict, EvidenceSet) {
        let mut record = EvidenceRecord::new("12345");
        record.title = "Vitamin D and cortisol".to_string();

        let mut verdict = Verdict::inconclusive(ExtractedClaim::new("Vitamin D", "lowers cortisol"));
        verdict.label = VerdictLabel::Supported;
        verdict.confidence = 0.5;
        verdict.supporting = 1;
        verdict.cited_evidence = vec![record.clone()];

        let evidence = EvidenceSet {
            query: "\"Vitamin D\"[tiab]".to_string(),
            total_available: 1,
            records: vec![record],
        };
        (verdict, evidence)
    }

    #[test]
    fn test_claim_review_document() {
        let (verdict, evidence) = supported_verdict();
        let asset = KnowledgeAsset::from_verdict(&verdict, &evidence).unwrap();
        let doc = asset.document();

        assert_eq!(doc["@type"], "ClaimReview");
        assert_eq!(doc["reviewRating"]["ratingValue"], 3);
        assert_eq!(doc["reviewRating"]["alternateName"], "supported");
        assert_eq!(doc["citation"][0]["identifier"], "pmid:12345");
        assert_eq!(
            doc["@id"],
            format!("urn:sha256:{}", asset.content_hash()).as_str()
        );
    }

    #[test]
    fn test_hash_is_stable_and_content_dependent() {
        let (verdict, evidence) = supported_verdict();
        let first = KnowledgeAsset::from_verdict(&verdict, &evidence).unwrap();
        let second = KnowledgeAsset::from_verdict(&verdict, &evidence).unwrap();
        assert_eq!(first.content_hash(), second.content_hash());
        assert_eq!(first.content_hash().len(), 64);

        let mut refuted = verdict.clone();
        refuted.label = VerdictLabel::Refuted;
        let third = KnowledgeAsset::from_verdict(&refuted, &evidence).unwrap();
        assert_ne!(first.content_hash(), third.content_hash());
    }

    #[test]
    fn test_digest_header_is_base64() {
        let (verdict, evidence) = supported_verdict();
        let asset = KnowledgeAsset::from_verdict(&verdict, &evidence).unwrap();
        let header = asset.digest_header();
        let encoded = header.strip_prefix("SHA-256=").unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap().len(), 32);
    }
}
