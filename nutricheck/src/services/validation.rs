use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nanoid::nanoid;

use crate::analysis::EvidenceAnalyzer;
use crate::config::{AnalysisConfig, Config, PipelineConfig};
use crate::error::{CheckError, Result};
use crate::intelligence::{
    ClaimExtractor, CompletionCache, LlmClaimExtractor, LlmTermEnricher, TermEnricher,
};
use crate::llm::LlmProvider;
use crate::models::{
    EnrichedTerms, EvidenceSet, EvidenceStatus, ExtractedClaim, PublishStatus, ValidationReport,
    Verdict,
};
use crate::publisher::{LedgerPublisher, ResultPublisher};
use crate::pubmed::{EvidenceSearch, PubMedClient, SearchFilters};

/// Per-request overrides of the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    pub max_results: Option<usize>,
    pub publish: Option<bool>,
    /// Only human studies.
    pub human_only: Option<bool>,
    /// Accepted publication types; empty accepts any.
    pub publication_types: Option<Vec<String>>,
}

impl ValidationOptions {
    pub fn search_filters(&self) -> SearchFilters {
        SearchFilters {
            human_only: self.human_only,
            publication_types: self.publication_types.clone(),
        }
    }
}

/// Runs one claim through extraction, enrichment, search, analysis and the
/// optional publication step.
#[derive(Clone)]
pub struct ClaimValidationService {
    extractor: Arc<dyn ClaimExtractor>,
    enricher: Arc<dyn TermEnricher>,
    search: Arc<dyn EvidenceSearch>,
    publisher: Option<Arc<dyn ResultPublisher>>,
    analysis: AnalysisConfig,
    pipeline: PipelineConfig,
    default_max_results: usize,
    auto_publish: bool,
}

impl ClaimValidationService {
    pub fn new(
        extractor: Arc<dyn ClaimExtractor>,
        enricher: Arc<dyn TermEnricher>,
        search: Arc<dyn EvidenceSearch>,
        publisher: Option<Arc<dyn ResultPublisher>>,
        config: &Config,
    ) -> Self {
        Self {
            extractor,
            enricher,
            search,
            publisher,
            analysis: config.analysis.clone(),
            pipeline: config.pipeline.clone(),
            default_max_results: config.pubmed.max_results,
            auto_publish: config.ledger.as_ref().is_some_and(|l| l.auto_publish),
        }
    }

    /// Wire the production components from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = CompletionCache::new(config.enrichment.cache_size);
        let extractor = LlmClaimExtractor::new(LlmProvider::new(config.extractor.as_ref()), cache);
        if !extractor.is_available() {
            tracing::warn!("Claim extraction model is not configured; validation requests will fail");
        }

        let enricher = LlmTermEnricher::from_config(&config.enrichment)?;
        let search = PubMedClient::new(config.pubmed.clone())?;
        let publisher = config
            .ledger
            .as_ref()
            .map(LedgerPublisher::new)
            .transpose()?
            .map(|p| Arc::new(p) as Arc<dyn ResultPublisher>);

        Ok(Self::new(
            Arc::new(extractor),
            Arc::new(enricher),
            Arc::new(search),
            publisher,
            config,
        ))
    }

    pub fn publisher_configured(&self) -> bool {
        self.publisher.is_some()
    }

    pub async fn validate(
        &self,
        claim: &str,
        options: &ValidationOptions,
    ) -> Result<ValidationReport> {
        let id = nanoid!();
        tracing::info!(report_id = %id, "Validating claim");

        let extracted = self.extract(claim).await?;
        let terms = self.enrich(&extracted).await;
        let search_terms = search_terms(&extracted, &terms);
        let max_results = options.max_results.unwrap_or(self.default_max_results);

        let (evidence_status, evidence, verdict) = match self
            .search_evidence(&search_terms, max_results, &options.search_filters())
            .await
        {
            Ok(evidence) => {
                let analyzer = EvidenceAnalyzer::for_claim(&extracted, &terms, &self.analysis);
                let verdict = analyzer.analyze(&evidence);
                (EvidenceStatus::Checked, evidence, verdict)
            }
            Err(e) if e.is_search_unavailable() => {
                tracing::warn!(report_id = %id, error = %e, "Evidence search unavailable");
                (
                    EvidenceStatus::Unavailable {
                        reason: e.to_string(),
                    },
                    EvidenceSet::empty(),
                    Verdict::inconclusive(extracted.clone()),
                )
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            report_id = %id,
            label = %verdict.label,
            confidence = verdict.confidence,
            records = evidence.len(),
            "Claim validated"
        );

        let publish_status = self
            .publish(options, &evidence_status, &verdict, &evidence)
            .await;

        Ok(ValidationReport {
            id,
            claim: claim.trim().to_string(),
            extracted,
            terms,
            evidence_status,
            evidence,
            verdict,
            publish_status,
            created_at: Utc::now(),
        })
    }

    async fn extract(&self, claim: &str) -> Result<ExtractedClaim> {
        let timeout = Duration::from_secs(self.pipeline.model_step_timeout_secs);
        match tokio::time::timeout(timeout, self.extractor.extract(claim)).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::Timeout(format!(
                "claim extraction exceeded {}s",
                timeout.as_secs()
            ))),
        }
    }

    async fn enrich(&self, extracted: &ExtractedClaim) -> EnrichedTerms {
        let timeout = Duration::from_secs(self.pipeline.model_step_timeout_secs);
        match tokio::time::timeout(timeout, self.enricher.enrich(extracted)).await {
            Ok(Ok(terms)) => terms,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Term enrichment failed, searching without extra terms");
                EnrichedTerms::new()
            }
            Err(_) => {
                tracing::warn!("Term enrichment timeout, searching without extra terms");
                EnrichedTerms::new()
            }
        }
    }

    async fn search_evidence(
        &self,
        terms: &[String],
        max_results: usize,
        filters: &SearchFilters,
    ) -> Result<EvidenceSet> {
        let timeout = Duration::from_secs(self.pipeline.search_timeout_secs);
        let search = self.search.search_filtered(terms, max_results, filters);
        match tokio::time::timeout(timeout, search).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::Timeout(format!(
                "evidence search exceeded {}s",
                timeout.as_secs()
            ))),
        }
    }

    async fn publish(
        &self,
        options: &ValidationOptions,
        evidence_status: &EvidenceStatus,
        verdict: &Verdict,
        evidence: &EvidenceSet,
    ) -> PublishStatus {
        if !options.publish.unwrap_or(self.auto_publish) {
            return PublishStatus::NotRequested;
        }
        let Some(publisher) = &self.publisher else {
            return PublishStatus::NotConfigured;
        };
        if !evidence_status.is_checked() {
            return PublishStatus::Skipped {
                reason: "evidence was not checked".to_string(),
            };
        }

        let timeout = Duration::from_secs(self.pipeline.publish_timeout_secs);
        match tokio::time::timeout(timeout, publisher.publish(verdict, evidence)).await {
            Ok(Ok(asset_id)) => PublishStatus::Published { asset_id },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Publishing verdict failed");
                PublishStatus::Failed {
                    error: e.to_string(),
                }
            }
            Err(_) => {
                tracing::warn!("Publishing verdict timed out");
                PublishStatus::Failed {
                    error: format!("publish exceeded {}s", timeout.as_secs()),
                }
            }
        }
    }
}

/// Subject, effect focus, then enriched terms; deduplicated, order kept.
pub fn search_terms(extracted: &ExtractedClaim, terms: &EnrichedTerms) -> Vec<String> {
    let mut all = EnrichedTerms::new();
    all.push(&extracted.subject);
    all.push(extracted.effect_focus());
    all.extend(terms);
    all.iter().cloned().collect()
}
