use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{KnowledgeAsset, ResultPublisher};
use crate::config::LedgerConfig;
use crate::error::{CheckError, Result};
use crate::models::{EvidenceSet, Verdict};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(alias = "ual")]
    asset_id: Option<String>,
}

/// Publishes verdicts to a decentralized knowledge ledger over HTTP.
///
/// One attempt per verdict. The ledger deduplicates on `contentHash`.
#[derive(Clone)]
pub struct LedgerPublisher {
    client: reqwest::Client,
    endpoint: String,
    signing_key: String,
}

impl LedgerPublisher {
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        url::Url::parse(&endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CheckError::Config(format!("Failed to build ledger client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            signing_key: config.signing_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ResultPublisher for LedgerPublisher {
    async fn publish(&self, verdict: &Verdict, evidence: &EvidenceSet) -> Result<String> {
        let asset = KnowledgeAsset::from_verdict(verdict, evidence)?;
        let body = json!({
            "asset": asset.document(),
            "contentHash": asset.content_hash(),
        });

        let response = self
            .client
            .post(format!("{}/assets", self.endpoint))
            .bearer_auth(&self.signing_key)
            .header("Digest", asset.digest_header())
            .json(&body)
            .send()
            .await
            .map_err(|e| CheckError::Publish(format!("ledger request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CheckError::Publish(format!(
                "ledger returned {status}: {}",
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| CheckError::Publish(format!("invalid ledger response: {e}")))?;

        let asset_id = parsed
            .asset_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CheckError::Publish("ledger response has no asset id".to_string()))?;

        tracing::info!(
            asset_id = %asset_id,
            content_hash = asset.content_hash(),
            label = %verdict.label,
            "Verdict published"
        );
        Ok(asset_id)
    }
}
