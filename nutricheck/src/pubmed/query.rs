use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::SearchFilters;
use crate::config::PubMedConfig;
use crate::error::{CheckError, Result};

/// Boolean operator joining the individual term clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOperator {
    #[default]
    Or,
    And,
}

impl QueryOperator {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
        }
    }
}

impl std::fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueryOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "or" => Ok(Self::Or),
            "and" => Ok(Self::And),
            _ => Err(format!("Unknown query operator: {s}. Valid: or, and")),
        }
    }
}

/// Builds E-utilities search expressions from free-text terms.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    operator: QueryOperator,
    field: String,
    human_only: bool,
    english_only: bool,
    require_abstract: bool,
    publication_types: Vec<String>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            operator: QueryOperator::Or,
            field: "tiab".to_string(),
            human_only: false,
            english_only: false,
            require_abstract: false,
            publication_types: Vec::new(),
        }
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PubMedConfig) -> Self {
        Self {
            operator: config.query_operator,
            field: config.field.clone(),
            human_only: config.human_only,
            english_only: config.english_only,
            require_abstract: config.require_abstract,
            publication_types: config.publication_types.clone(),
        }
    }

    pub fn operator(mut self, operator: QueryOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn human_only(mut self, enabled: bool) -> Self {
        self.human_only = enabled;
        self
    }

    pub fn english_only(mut self, enabled: bool) -> Self {
        self.english_only = enabled;
        self
    }

    pub fn require_abstract(mut self, enabled: bool) -> Self {
        self.require_abstract = enabled;
        self
    }

    pub fn publication_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.publication_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Copy of this builder with the given overrides applied.
    pub fn with_filters(&self, filters: &SearchFilters) -> Self {
        let mut builder = self.clone();
        if let Some(human_only) = filters.human_only {
            builder.human_only = human_only;
        }
        if let Some(ref types) = filters.publication_types {
            builder.publication_types = types.clone();
        }
        builder
    }

    /// Build the search expression.
    ///
    /// Each usable term becomes `"term"[field]`; blank terms and duplicates
    /// (ignoring case) are dropped. Fails with `InvalidQuery` when no term
    /// survives.
    pub fn build<S: AsRef<str>>(&self, terms: &[S]) -> Result<String> {
        let mut seen = HashSet::new();
        let clauses: Vec<String> = terms
            .iter()
            .filter_map(|term| {
                let cleaned = clean_term(term.as_ref());
                if cleaned.is_empty() || !seen.insert(cleaned.to_lowercase()) {
                    return None;
                }
                Some(format!("\"{cleaned}\"[{}]", self.field))
            })
            .collect();

        if clauses.is_empty() {
            return Err(CheckError::InvalidQuery(
                "no usable search terms".to_string(),
            ));
        }

        let joined = clauses.join(&format!(" {} ", self.operator));
        let mut query = if clauses.len() > 1 {
            format!("({joined})")
        } else {
            joined
        };

        for filter in self.filters() {
            query.push_str(" AND ");
            query.push_str(&filter);
        }

        Ok(query)
    }

    fn filters(&self) -> Vec<String> {
        let mut filters = Vec::new();

        if self.human_only {
            filters.push("humans[MeSH Terms]".to_string());
        }

        let types: Vec<String> = self
            .publication_types
            .iter()
            .map(|t| clean_term(t))
            .filter(|t| !t.is_empty())
            .map(|t| format!("{t}[pt]"))
            .collect();
        match types.len() {
            0 => {}
            1 => filters.push(types[0].clone()),
            _ => filters.push(format!("({})", types.join(" OR "))),
        }

        if self.english_only {
            filters.push("English[lang]".to_string());
        }
        if self.require_abstract {
            filters.push("hasabstract".to_string());
        }

        filters
    }
}

/// Strip embedded double quotes and collapse whitespace.
fn clean_term(term: &str) -> String {
    term.replace('"', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
