mod common;

use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nutricheck::config::PubMedConfig;
use nutricheck::error::CheckError;
use nutricheck::pubmed::{EvidenceSearch, PubMedClient};

use common::{article, article_set, esearch_body, pubmed_config};

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn mount_efetch(server: &MockServer, ids: &str, articles: Vec<String>) {
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("id", ids))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_set(&articles)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_zero_max_results_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["zinc"]), 0).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.total_available, 0);
}

#[tokio::test]
async fn test_search_sends_ncbi_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("tool", "nutricheck"))
        .and(query_param("email", "tests@example.org"))
        .and(query_param("api_key", "ncbi-key"))
        .and(query_param("retmode", "json"))
        .and(query_param("sort", "relevance"))
        .and(query_param("term", "(\"vitamin D\"[tiab] OR \"cortisol\"[tiab])"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(1, &["100"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_efetch(
        &server,
        "100",
        vec![article("100", "Vitamin D and cortisol", "Cortisol fell.")],
    )
    .await;

    let client = PubMedClient::new(PubMedConfig {
        api_key: Some("ncbi-key".to_string()),
        ..pubmed_config(&server.uri())
    })
    .unwrap();
    let result = client
        .search(&terms(&["vitamin D", "cortisol"]), 5)
        .await
        .unwrap();

    assert_eq!(result.query, "(\"vitamin D\"[tiab] OR \"cortisol\"[tiab])");
    assert_eq!(result.total_available, 1);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].title, "Vitamin D and cortisol");
    assert_eq!(result.records[0].publication_date, "2021-06");
}

#[tokio::test]
async fn test_pages_are_deduplicated_in_first_seen_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("retstart", "0"))
        .and(query_param("retmax", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(4, &["1", "2"])))
        .expect(1)
        .mount(&server)
        .await;
    // The source shifted between requests and repeats an id.
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("retstart", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(4, &["2"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("retstart", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(4, &["3"])))
        .expect(1)
        .mount(&server)
        .await;

    mount_efetch(
        &server,
        "1,2",
        vec![article("2", "Second", "B."), article("1", "First", "A.")],
    )
    .await;
    mount_efetch(&server, "3", vec![article("3", "Third", "C.")]).await;

    let client = PubMedClient::new(PubMedConfig {
        page_size: 2,
        ..pubmed_config(&server.uri())
    })
    .unwrap();
    let result = client.search(&terms(&["zinc"]), 3).await.unwrap();

    let ids: Vec<&str> = result.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(result.total_available, 4);
}

#[tokio::test]
async fn test_search_stops_when_results_run_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(1, &["7"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_efetch(&server, "7", vec![article("7", "Only hit", "Z.")]).await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["zinc"]), 50).await.unwrap();

    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_no_hits_is_an_empty_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(0, &[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["unobtainium"]), 10).await.unwrap();

    assert!(result.is_empty());
    assert!(!result.query.is_empty());
}

#[tokio::test]
async fn test_blank_terms_are_invalid_query() {
    let server = MockServer::start().await;
    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();

    let result = client.search(&terms(&["  ", ""]), 10).await;

    assert!(matches!(result, Err(CheckError::InvalidQuery(_))));
}

#[tokio::test]
async fn test_client_error_is_rejected_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad term"))
        .expect(1)
        .mount(&server)
        .await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["zinc"]), 5).await;

    match result {
        Err(CheckError::SearchRejected(message)) => assert!(message.contains("400")),
        other => panic!("Expected SearchRejected error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried_then_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&server)
        .await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["zinc"]), 5).await;

    let err = result.unwrap_err();
    assert!(matches!(err, CheckError::Upstream(_)), "got {err:?}");
    assert!(err.is_search_unavailable());
}

#[tokio::test]
async fn test_server_error_recovers_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(1, &["5"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_efetch(&server, "5", vec![article("5", "Recovered", "R.")]).await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["zinc"]), 5).await.unwrap();

    assert_eq!(result.records[0].id, "5");
}

#[tokio::test]
async fn test_throttling_exhaustion_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["zinc"]), 5).await;

    assert!(matches!(
        result,
        Err(CheckError::RateLimitExceeded {
            retry_after: Some(0)
        })
    ));
}

#[tokio::test]
async fn test_esearch_error_field_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": { "ERROR": "Invalid query" }
        })))
        .mount(&server)
        .await;

    let client = PubMedClient::new(pubmed_config(&server.uri())).unwrap();
    let result = client.search(&terms(&["zinc"]), 5).await;

    match result {
        Err(err @ CheckError::SearchRejected(_)) => {
            assert!(err.to_string().contains("Invalid query"));
            assert!(!err.is_search_unavailable());
        }
        other => panic!("Expected SearchRejected error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_searches_share_the_pacer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(0, &[])))
        .expect(4)
        .mount(&server)
        .await;

    // 20 requests per second: one request every 50ms across all clones.
    let config = PubMedConfig {
        requests_per_second: 20.0,
        ..pubmed_config(&server.uri())
    };
    let client = PubMedClient::new(config).unwrap();
    let start = Instant::now();

    let searches = (0..4).map(|_| {
        let client = client.clone();
        async move { client.search(&terms(&["zinc"]), 5).await }
    });
    let results = futures::future::join_all(searches).await;

    for result in results {
        assert!(result.unwrap().is_empty());
    }
    // Four requests need at least three intervals.
    assert!(start.elapsed() + Duration::from_millis(2) >= Duration::from_millis(150));
}
