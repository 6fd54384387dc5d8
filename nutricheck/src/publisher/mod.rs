mod asset;
mod ledger;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EvidenceSet, Verdict};

pub use asset::KnowledgeAsset;
pub use ledger::LedgerPublisher;

/// Records a verdict in an external registry and returns its asset id.
#[async_trait]
pub trait ResultPublisher: Send + Sync {
    async fn publish(&self, verdict: &Verdict, evidence: &EvidenceSet) -> Result<String>;
}
