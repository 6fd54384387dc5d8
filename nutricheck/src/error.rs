use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Claim extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    /// PubMed refused the search itself. Retrying the same query cannot help.
    #[error("Search rejected: {0}")]
    SearchRejected(String),

    #[error("Upstream rate limit exceeded, retry after {retry_after:?} seconds")]
    RateLimitExceeded { retry_after: Option<u64> },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl CheckError {
    /// Errors after which the evidence could not be checked, as opposed to
    /// errors that make the whole run meaningless.
    pub fn is_search_unavailable(&self) -> bool {
        matches!(
            self,
            CheckError::Upstream(_)
                | CheckError::RateLimitExceeded { .. }
                | CheckError::Timeout(_)
                | CheckError::Http(_)
                | CheckError::Xml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
