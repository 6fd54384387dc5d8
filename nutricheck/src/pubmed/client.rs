use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

use super::parser::parse_article_set;
use super::query::QueryBuilder;
use super::rate_limiter::{shared_limiter, SharedRateLimiter};
use super::{EvidenceSearch, SearchFilters};
use crate::config::PubMedConfig;
use crate::error::{CheckError, Result};
use crate::models::{EvidenceRecord, EvidenceSet};

/// Upper bound honoured for a server supplied `Retry-After`.
const MAX_RETRY_AFTER_SECS: u64 = 30;
const MAX_BACKOFF_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(default, rename = "ERROR")]
    error: Option<String>,
}

struct SearchPage {
    count: u64,
    ids: Vec<String>,
}

/// Last failure seen by the retry loop.
#[derive(Debug)]
enum TransientFailure {
    Throttled { retry_after: Option<u64> },
    Timeout(String),
    Upstream(String),
}

impl From<TransientFailure> for CheckError {
    fn from(failure: TransientFailure) -> Self {
        match failure {
            TransientFailure::Throttled { retry_after } => {
                CheckError::RateLimitExceeded { retry_after }
            }
            TransientFailure::Timeout(msg) => CheckError::Timeout(msg),
            TransientFailure::Upstream(msg) => CheckError::Upstream(msg),
        }
    }
}

/// NCBI E-utilities client. Clones share the same HTTP pool and pacer.
#[derive(Clone)]
pub struct PubMedClient {
    client: Client,
    config: PubMedConfig,
    query_builder: QueryBuilder,
    limiter: SharedRateLimiter,
}

impl PubMedClient {
    pub fn new(config: PubMedConfig) -> Result<Self> {
        let limiter = shared_limiter("pubmed", config.requests_per_second);
        Self::with_rate_limiter(config, limiter)
    }

    /// Build a client that paces its requests through an existing limiter.
    pub fn with_rate_limiter(config: PubMedConfig, limiter: SharedRateLimiter) -> Result<Self> {
        if config.contact_email.trim().is_empty() {
            return Err(CheckError::Config(
                "PUBMED_CONTACT_EMAIL is required by NCBI usage policy".to_string(),
            ));
        }
        if config.page_size == 0 {
            return Err(CheckError::Config(
                "PUBMED_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CheckError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            query_builder: QueryBuilder::from_config(&config),
            config,
            limiter,
        })
    }

    pub fn rate_limiter(&self) -> &SharedRateLimiter {
        &self.limiter
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.config.base_url.trim_end_matches('/'))
    }

    fn common_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("tool", self.config.tool.clone()),
            ("email", self.config.contact_email.clone()),
        ];
        if let Some(ref api_key) = self.config.api_key {
            params.push(("api_key", api_key.clone()));
        }
        params
    }

    fn new_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.config.retry_base_delay_ms))
            .with_multiplier(2.0)
            .with_randomization_factor(0.5)
            .with_max_interval(MAX_BACKOFF_INTERVAL)
            .with_max_elapsed_time(None)
            .build()
    }

    /// GET an E-utilities endpoint, pacing every attempt and retrying
    /// transient failures. Returns the response body.
    async fn get_with_retry(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let url = self.endpoint(endpoint);
        let mut backoff = self.new_backoff();
        let mut last_failure = None;

        for attempt in 0..=self.config.max_retries {
            self.limiter.acquire().await;

            let mut retry_after = None;
            let response = self.client.get(&url).query(params).send().await;

            let failure = match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        match resp.text().await {
                            Ok(body) => return Ok(body),
                            Err(e) if e.is_timeout() => TransientFailure::Timeout(format!(
                                "Reading {endpoint} response timed out: {e}"
                            )),
                            Err(e) => TransientFailure::Upstream(format!(
                                "Failed to read {endpoint} response: {e}"
                            )),
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.trim().parse::<u64>().ok());
                        TransientFailure::Throttled { retry_after }
                    } else if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        TransientFailure::Upstream(format!(
                            "PubMed {endpoint} returned {status}: {body}"
                        ))
                    } else {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(CheckError::SearchRejected(format!(
                            "PubMed {endpoint} rejected the request with {status}: {body}"
                        )));
                    }
                }
                Err(e) if e.is_timeout() => {
                    TransientFailure::Timeout(format!("PubMed {endpoint} timed out: {e}"))
                }
                Err(e) => TransientFailure::Upstream(format!("PubMed {endpoint} request failed: {e}")),
            };

            if attempt < self.config.max_retries {
                let mut delay = backoff.next_backoff().unwrap_or(MAX_BACKOFF_INTERVAL);
                if let Some(secs) = retry_after {
                    delay = delay.max(Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)));
                }
                warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = self.config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    failure = ?failure,
                    "Retrying PubMed request"
                );
                tokio::time::sleep(delay).await;
            }

            last_failure = Some(failure);
        }

        Err(last_failure
            .map(CheckError::from)
            .unwrap_or_else(|| CheckError::Upstream("PubMed request was never attempted".to_string())))
    }

    async fn esearch(&self, query: &str, retstart: usize, retmax: usize) -> Result<SearchPage> {
        let mut params = self.common_params();
        params.extend([
            ("term", query.to_string()),
            ("retmode", "json".to_string()),
            ("sort", "relevance".to_string()),
            ("retstart", retstart.to_string()),
            ("retmax", retmax.to_string()),
        ]);

        let body = self.get_with_retry("esearch.fcgi", &params).await?;
        let parsed: ESearchResponse = serde_json::from_str(&body)
            .map_err(|e| CheckError::Upstream(format!("Malformed esearch response: {e}")))?;
        let result = parsed.esearchresult;

        if let Some(error) = result.error {
            return Err(CheckError::SearchRejected(format!("esearch error: {error}")));
        }

        let count = result
            .count
            .as_deref()
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(0);

        Ok(SearchPage {
            count,
            ids: result.idlist,
        })
    }

    async fn efetch(&self, ids: &[String]) -> Result<Vec<EvidenceRecord>> {
        let mut params = self.common_params();
        params.extend([
            ("id", ids.join(",")),
            ("retmode", "xml".to_string()),
            ("rettype", "abstract".to_string()),
        ]);

        let body = self.get_with_retry("efetch.fcgi", &params).await?;
        parse_article_set(&body)
    }
}

#[async_trait]
impl EvidenceSearch for PubMedClient {
    async fn search_filtered(
        &self,
        terms: &[String],
        max_results: usize,
        filters: &SearchFilters,
    ) -> Result<EvidenceSet> {
        if max_results == 0 {
            return Ok(EvidenceSet::empty());
        }

        let query = self.query_builder.with_filters(filters).build(terms)?;
        debug!(query = %query, max_results, "Searching PubMed");

        let mut seen: HashSet<String> = HashSet::new();
        let mut records: Vec<EvidenceRecord> = Vec::new();
        let mut total_available = 0;
        let mut retstart = 0;

        while records.len() < max_results {
            let retmax = self.config.page_size.min(max_results - records.len());
            let page = self.esearch(&query, retstart, retmax).await?;
            total_available = page.count;

            if page.ids.is_empty() {
                debug!(retstart, "PubMed returned an empty page");
                break;
            }
            retstart += page.ids.len();

            let new_ids: Vec<String> = page
                .ids
                .into_iter()
                .filter(|id| seen.insert(id.clone()))
                .collect();
            debug!(
                retstart,
                count = total_available,
                new_ids = new_ids.len(),
                "Fetched PubMed page"
            );

            if !new_ids.is_empty() {
                let mut fetched: HashMap<String, EvidenceRecord> = self
                    .efetch(&new_ids)
                    .await?
                    .into_iter()
                    .map(|record| (record.id.clone(), record))
                    .collect();

                for id in &new_ids {
                    if records.len() >= max_results {
                        break;
                    }
                    if let Some(record) = fetched.remove(id) {
                        records.push(record);
                    }
                }
            }

            if retstart as u64 >= total_available {
                break;
            }
        }

        Ok(EvidenceSet {
            query,
            total_available,
            records,
        })
    }
}
