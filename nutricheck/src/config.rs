use serde::Deserialize;
use std::env;

use crate::pubmed::QueryOperator;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

/// Parse a comma-separated list, dropping blank entries.
fn parse_env_list(var: &str) -> Vec<String> {
    env::var(var)
        .map(|val| {
            val.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pubmed: PubMedConfig,
    pub extractor: Option<LlmConfig>,
    pub enrichment: EnrichmentConfig,
    pub analysis: AnalysisConfig,
    pub pipeline: PipelineConfig,
    pub ledger: Option<LedgerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
}

pub const DEFAULT_PUBMED_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// NCBI allows 3 requests per second without an API key and 10 with one.
pub const PUBMED_RPS_ANONYMOUS: f64 = 3.0;
pub const PUBMED_RPS_WITH_KEY: f64 = 10.0;

#[derive(Debug, Clone, Deserialize)]
pub struct PubMedConfig {
    pub base_url: String,
    pub contact_email: String,
    pub tool: String,
    pub api_key: Option<String>,
    pub max_results: usize,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub requests_per_second: f64,
    pub query_operator: QueryOperator,
    pub field: String,
    pub human_only: bool,
    pub english_only: bool,
    pub require_abstract: bool,
    pub publication_types: Vec<String>,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PUBMED_BASE_URL.to_string(),
            contact_email: String::new(),
            tool: "nutricheck".to_string(),
            api_key: None,
            max_results: 20,
            page_size: 20,
            timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 500,
            requests_per_second: PUBMED_RPS_ANONYMOUS,
            query_operator: QueryOperator::Or,
            field: "tiab".to_string(),
            human_only: true,
            english_only: true,
            require_abstract: true,
            publication_types: Vec::new(),
        }
    }
}

/// LLM configuration for chat/completion models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub llm: Option<LlmConfig>,
    pub max_terms: usize,
    /// JSON lexicon mapping consumer phrases to standard vocabulary.
    pub lexicon_path: Option<String>,
    pub cache_size: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            llm: None,
            max_terms: 8,
            lexicon_path: None,
            cache_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Only the first `top_k` relevant records take part in the vote.
    pub top_k: usize,
    /// Minimum share of claim words a record must contain to count as contextual.
    pub contextual_min_overlap: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            contextual_min_overlap: 0.25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub search_timeout_secs: u64,
    /// Bound on each model step (extraction, enrichment), retries included.
    pub model_step_timeout_secs: u64,
    pub publish_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_timeout_secs: 60,
            model_step_timeout_secs: 120,
            publish_timeout_secs: 45,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub endpoint: String,
    pub signing_key: String,
    pub timeout_secs: u64,
    pub auto_publish: bool,
}

impl Default for Config {
    fn default() -> Self {
        let api_key = non_empty_env("NCBI_API_KEY");
        let default_rps = if api_key.is_some() {
            PUBMED_RPS_WITH_KEY
        } else {
            PUBMED_RPS_ANONYMOUS
        };

        Self {
            server: ServerConfig {
                host: env::var("NUTRICHECK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("NUTRICHECK_PORT", 3000),
                api_keys: parse_env_list("NUTRICHECK_API_KEYS"),
            },
            pubmed: PubMedConfig {
                base_url: env::var("PUBMED_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_PUBMED_BASE_URL.to_string()),
                contact_email: env::var("PUBMED_CONTACT_EMAIL").unwrap_or_default(),
                tool: env::var("PUBMED_TOOL").unwrap_or_else(|_| "nutricheck".to_string()),
                api_key,
                max_results: parse_env_or("PUBMED_MAX_RESULTS", 20),
                page_size: parse_env_or("PUBMED_PAGE_SIZE", 20),
                timeout_secs: parse_env_or("PUBMED_TIMEOUT", 10),
                max_retries: parse_env_or("PUBMED_MAX_RETRIES", 3),
                retry_base_delay_ms: parse_env_or("PUBMED_RETRY_BASE_DELAY_MS", 500),
                requests_per_second: parse_env_opt::<f64>("PUBMED_REQUESTS_PER_SECOND")
                    .filter(|rps| *rps > 0.0)
                    .unwrap_or(default_rps),
                query_operator: parse_env_or("PUBMED_QUERY_OPERATOR", QueryOperator::Or),
                field: env::var("PUBMED_FIELD").unwrap_or_else(|_| "tiab".to_string()),
                human_only: parse_env_or("PUBMED_HUMAN_ONLY", true),
                english_only: parse_env_or("PUBMED_ENGLISH_ONLY", true),
                require_abstract: parse_env_or("PUBMED_REQUIRE_ABSTRACT", true),
                publication_types: parse_env_list("PUBMED_PUBLICATION_TYPES"),
            },
            extractor: non_empty_env("EXTRACTOR_MODEL").map(|model| LlmConfig {
                model,
                api_key: env::var("EXTRACTOR_API_KEY").ok(),
                base_url: env::var("EXTRACTOR_BASE_URL").ok(),
                timeout_secs: parse_env_or("EXTRACTOR_TIMEOUT", 30),
                max_retries: parse_env_or("EXTRACTOR_MAX_RETRIES", 2),
            }),
            enrichment: EnrichmentConfig {
                llm: non_empty_env("ENRICHMENT_MODEL").map(|model| LlmConfig {
                    model,
                    api_key: env::var("ENRICHMENT_API_KEY").ok(),
                    base_url: env::var("ENRICHMENT_BASE_URL").ok(),
                    timeout_secs: parse_env_or("ENRICHMENT_TIMEOUT", 30),
                    max_retries: parse_env_or("ENRICHMENT_MAX_RETRIES", 2),
                }),
                max_terms: parse_env_or("ENRICHMENT_MAX_TERMS", 8),
                lexicon_path: non_empty_env("LEXICON_PATH"),
                cache_size: parse_env_or("MODEL_CACHE_SIZE", 1000),
            },
            analysis: AnalysisConfig {
                top_k: parse_env_or("ANALYSIS_TOP_K", 10),
                contextual_min_overlap: parse_env_or("ANALYSIS_CONTEXTUAL_MIN_OVERLAP", 0.25),
            },
            pipeline: PipelineConfig {
                search_timeout_secs: parse_env_or("SEARCH_TIMEOUT", 60),
                model_step_timeout_secs: parse_env_or("MODEL_STEP_TIMEOUT", 120),
                publish_timeout_secs: parse_env_or("PUBLISH_TIMEOUT", 45),
            },
            ledger: match (
                non_empty_env("LEDGER_ENDPOINT"),
                non_empty_env("LEDGER_SIGNING_KEY"),
            ) {
                (Some(endpoint), Some(signing_key)) => Some(LedgerConfig {
                    endpoint,
                    signing_key,
                    timeout_secs: parse_env_or("LEDGER_TIMEOUT", 30),
                    auto_publish: parse_env_or("LEDGER_AUTO_PUBLISH", false),
                }),
                (Some(_), None) => {
                    tracing::warn!("LEDGER_ENDPOINT is set but LEDGER_SIGNING_KEY is missing; publishing disabled");
                    None
                }
                _ => None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
