#![allow(dead_code)]

use serde_json::json;

use nutricheck::config::{LlmConfig, PubMedConfig};

/// PubMed settings pointed at a mock server, with pacing and backoff short
/// enough for tests.
pub fn pubmed_config(base_url: &str) -> PubMedConfig {
    PubMedConfig {
        base_url: base_url.to_string(),
        contact_email: "tests@example.org".to_string(),
        max_retries: 2,
        retry_base_delay_ms: 1,
        requests_per_second: 1000.0,
        human_only: false,
        english_only: false,
        require_abstract: false,
        ..Default::default()
    }
}

/// Model settings for an OpenAI-compatible mock server.
pub fn llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        model: "test-model".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url.to_string()),
        timeout_secs: 10,
        max_retries: 2,
    }
}

/// Body of an esearch JSON response.
pub fn esearch_body(count: u64, ids: &[&str]) -> serde_json::Value {
    json!({
        "header": { "type": "esearch", "version": "0.3" },
        "esearchresult": {
            "count": count.to_string(),
            "retmax": ids.len().to_string(),
            "retstart": "0",
            "idlist": ids,
        }
    })
}

/// One `<PubmedArticle>` with a title and a single abstract section.
pub fn article(pmid: &str, title: &str, abstract_text: &str) -> String {
    format!(
        r#"<PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">{pmid}</PMID>
      <Article PubModel="Print">
        <Journal>
          <JournalIssue><PubDate><Year>2021</Year><Month>Jun</Month></PubDate></JournalIssue>
          <Title>Nutrients</Title>
        </Journal>
        <ArticleTitle>{title}</ArticleTitle>
        <Abstract><AbstractText>{abstract_text}</AbstractText></Abstract>
        <PublicationTypeList>
          <PublicationType UI="D016428">Journal Article</PublicationType>
        </PublicationTypeList>
      </Article>
    </MedlineCitation>
  </PubmedArticle>"#
    )
}

/// An efetch XML document wrapping the given articles.
pub fn article_set(articles: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" ?>\n<PubmedArticleSet>\n{}\n</PubmedArticleSet>",
        articles.join("\n")
    )
}

/// Body of a successful OpenAI chat completion.
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1234567890,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 20,
            "total_tokens": 30
        }
    })
}

/// Body of an OpenAI API error.
pub fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": null,
            "code": code
        }
    })
}
