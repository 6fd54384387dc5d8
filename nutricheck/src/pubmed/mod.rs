mod client;
mod parser;
mod query;
mod rate_limiter;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::EvidenceSet;

pub use client::PubMedClient;
pub use parser::parse_article_set;
pub use query::{QueryBuilder, QueryOperator};
pub use rate_limiter::{shared_limiter, RateLimiter, SharedRateLimiter};

/// Per-search overrides of the configured query filters. `None` keeps the
/// configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Restrict to studies indexed with the Humans MeSH term.
    pub human_only: Option<bool>,
    /// Publication types such as "Randomized Controlled Trial", any of which
    /// may match. An empty list lifts the configured restriction.
    pub publication_types: Option<Vec<String>>,
}

/// A source of published evidence.
#[async_trait]
pub trait EvidenceSearch: Send + Sync {
    /// Search for up to `max_results` records matching `terms`.
    ///
    /// `max_results == 0` returns an empty set without touching the network.
    async fn search(&self, terms: &[String], max_results: usize) -> Result<EvidenceSet> {
        self.search_filtered(terms, max_results, &SearchFilters::default())
            .await
    }

    /// Like [`EvidenceSearch::search`], with per-search filter overrides.
    async fn search_filtered(
        &self,
        terms: &[String],
        max_results: usize,
        filters: &SearchFilters,
    ) -> Result<EvidenceSet>;
}
