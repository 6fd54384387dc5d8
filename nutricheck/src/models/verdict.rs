use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EvidenceRecord, ExtractedClaim};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerdictLabel {
    Supported,
    Refuted,
    Inconclusive,
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supported => write!(f, "supported"),
            Self::Refuted => write!(f, "refuted"),
            Self::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

/// How closely a record addresses the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceTier {
    /// Both subject and effect are discussed.
    Direct,
    /// Only one of subject or effect is discussed.
    Indirect,
    /// Neither concept matched but the vocabulary overlaps.
    Contextual,
    NotRelevant,
}

impl RelevanceTier {
    pub fn weight(&self) -> f32 {
        match self {
            Self::Direct => 1.0,
            Self::Indirect => 0.5,
            Self::Contextual => 0.2,
            Self::NotRelevant => 0.0,
        }
    }

    pub fn is_relevant(&self) -> bool {
        !matches!(self, Self::NotRelevant)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Supports,
    Refutes,
    Neutral,
}

impl Stance {
    pub fn sign(&self) -> f32 {
        match self {
            Self::Supports => 1.0,
            Self::Refutes => -1.0,
            Self::Neutral => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordAssessment {
    pub record_id: String,
    pub relevance: RelevanceTier,
    pub stance: Stance,
    /// Strength of the study design in `[0, 1]`.
    pub design_score: f32,
    /// Reported number of participants, scored in `[0, 1]`.
    pub sample_size_score: f32,
    /// Strongest reported significance, scored in `[0, 1]`.
    pub significance_score: f32,
    /// Weighted design, sample size and significance in `[0, 1]`. Together
    /// with relevance this weights the record in the truth score.
    pub quality_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub claim: ExtractedClaim,
    pub label: VerdictLabel,
    /// In `[0, 1]`; zero for inconclusive verdicts.
    pub confidence: f32,
    /// Weighted balance of the evidence in `[-1, 1]`.
    pub truth_score: f32,
    pub cited_evidence: Vec<EvidenceRecord>,
    pub assessments: Vec<RecordAssessment>,
    pub supporting: usize,
    pub refuting: usize,
    pub neutral: usize,
}

impl Verdict {
    pub fn inconclusive(claim: ExtractedClaim) -> Self {
        Self {
            claim,
            label: VerdictLabel::Inconclusive,
            confidence: 0.0,
            truth_score: 0.0,
            cited_evidence: Vec::new(),
            assessments: Vec::new(),
            supporting: 0,
            refuting: 0,
            neutral: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconclusive_verdict_is_empty() {
        let verdict = Verdict::inconclusive(ExtractedClaim::new("Zinc", "colds"));
        assert_eq!(verdict.label, VerdictLabel::Inconclusive);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.cited_evidence.is_empty());
    }

    #[test]
    fn relevance_weights_decrease_by_tier() {
        assert!(RelevanceTier::Direct.weight() > RelevanceTier::Indirect.weight());
        assert!(RelevanceTier::Indirect.weight() > RelevanceTier::Contextual.weight());
        assert!(!RelevanceTier::NotRelevant.is_relevant());
    }

    #[test]
    fn verdict_label_serializes_lowercase() {
        let json = serde_json::to_string(&VerdictLabel::Supported).unwrap();
        assert_eq!(json, "\"supported\"");
        assert_eq!(VerdictLabel::Refuted.to_string(), "refuted");
    }
}
