use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// A normalized study record. Missing source fields are left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    /// PubMed identifier (PMID).
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`; empty when unknown.
    pub publication_date: String,
    pub journal: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: Vec<String>,
    pub publication_types: Vec<String>,
    pub url: String,
}

impl EvidenceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let url = pubmed_url(&id);
        Self {
            id,
            url,
            ..Default::default()
        }
    }

    /// Title and abstract joined for lexical analysis.
    pub fn searchable_text(&self) -> String {
        match (self.title.is_empty(), self.abstract_text.is_empty()) {
            (false, false) => format!("{}. {}", self.title.trim_end_matches('.'), self.abstract_text),
            (false, true) => self.title.clone(),
            (true, false) => self.abstract_text.clone(),
            (true, true) => String::new(),
        }
    }
}

pub fn pubmed_url(pmid: &str) -> String {
    format!("{PUBMED_ARTICLE_URL}/{pmid}/")
}

/// Result of one evidence search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSet {
    /// The query string sent to the source; empty when no request was made.
    pub query: String,
    /// Hit count reported by the source, which may exceed `records.len()`.
    pub total_available: u64,
    /// Unique by id, in source relevance order.
    pub records: Vec<EvidenceRecord>,
}

impl EvidenceSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Whether the evidence source could be consulted at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EvidenceStatus {
    Checked,
    Unavailable { reason: String },
}

impl EvidenceStatus {
    pub fn is_checked(&self) -> bool {
        matches!(self, EvidenceStatus::Checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_links_to_pubmed() {
        let record = EvidenceRecord::new("12345");
        assert_eq!(record.url, "https://pubmed.ncbi.nlm.nih.gov/12345/");
        assert!(record.authors.is_empty());
        assert_eq!(record.publication_date, "");
    }

    #[test]
    fn searchable_text_joins_title_and_abstract() {
        let mut record = EvidenceRecord::new("1");
        assert_eq!(record.searchable_text(), "");

        record.title = "Vitamin D and cortisol.".to_string();
        assert_eq!(record.searchable_text(), "Vitamin D and cortisol.");

        record.abstract_text = "Cortisol decreased.".to_string();
        assert_eq!(
            record.searchable_text(),
            "Vitamin D and cortisol. Cortisol decreased."
        );
    }

    #[test]
    fn record_serializes_abstract_field() {
        let record = EvidenceRecord {
            abstract_text: "text".to_string(),
            ..EvidenceRecord::new("9")
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["abstract"], "text");
        assert_eq!(json["publicationDate"], "");
    }

    #[test]
    fn evidence_status_is_tagged() {
        let json = serde_json::to_value(EvidenceStatus::Unavailable {
            reason: "timeout".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "timeout");
    }
}
