use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EnrichedTerms, EvidenceSet, EvidenceStatus, ExtractedClaim, Verdict};

/// Outcome of the optional ledger publication step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PublishStatus {
    NotRequested,
    NotConfigured,
    Skipped { reason: String },
    #[serde(rename_all = "camelCase")]
    Published { asset_id: String },
    Failed { error: String },
}

/// Everything produced by one validation run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub id: String,
    pub claim: String,
    pub extracted: ExtractedClaim,
    pub terms: EnrichedTerms,
    pub evidence_status: EvidenceStatus,
    pub evidence: EvidenceSet,
    pub verdict: Verdict,
    pub publish_status: PublishStatus,
    pub created_at: DateTime<Utc>,
}
