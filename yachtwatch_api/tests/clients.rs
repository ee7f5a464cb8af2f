use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yachtwatch_api::{Error, LlmClient, RenderClient, WikiClient};

#[tokio::test]
async fn wiki_search_returns_ranked_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {
                "search": [
                    { "title": "Koru (yacht)", "snippet": "a <span>sailing yacht</span>", "pageid": 111 },
                    { "title": "Koru", "snippet": "Maori symbol", "pageid": 222 }
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = WikiClient::with_base_url(&server.uri()).unwrap();
    let hits = client.search("\"Koru\" yacht", 5).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Koru (yacht)");
    assert_eq!(hits[0].page_id, 111);
}

#[tokio::test]
async fn wiki_lead_extract_unwraps_pages_map() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "extracts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {
                "pages": {
                    "111": { "pageid": 111, "title": "Koru (yacht)", "extract": "Koru is a sailing yacht built by Oceanco." }
                }
            }
        })))
        .mount(&server)
        .await;

    let client = WikiClient::with_base_url(&server.uri()).unwrap();
    let extract = client.lead_extract("Koru (yacht)").await.unwrap();
    assert_eq!(
        extract.as_deref(),
        Some("Koru is a sailing yacht built by Oceanco.")
    );
}

#[tokio::test]
async fn wiki_extract_missing_page_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": { "pages": { "-1": { "missing": "" } } }
        })))
        .mount(&server)
        .await;

    let client = WikiClient::with_base_url(&server.uri()).unwrap();
    let extract = client.lead_extract("No Such Vessel").await.unwrap();
    assert!(extract.is_none());
}

#[tokio::test]
async fn render_client_surfaces_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(451))
        .mount(&server)
        .await;

    let detail_base = format!("{}/details/shipid:", server.uri());
    let client = RenderClient::with_urls(&server.uri(), &detail_base).unwrap();
    // The proxied URL is {proxy}/{detail_url}; against the mock server every
    // path returns 451, which must surface as an HttpStatus error.
    let err = client.fetch_detail_markdown("123").await.unwrap_err();
    match err {
        Error::HttpStatus { status, .. } => assert_eq!(status, 451),
        other => panic!("expected HttpStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn render_client_empty_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
        .mount(&server)
        .await;

    let detail_base = format!("{}/details/shipid:", server.uri());
    let client = RenderClient::with_urls(&server.uri(), &detail_base).unwrap();
    let body = client.fetch_detail_markdown("123").await.unwrap();
    assert!(body.is_none());
}

#[tokio::test]
async fn llm_client_returns_first_text_block() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_1",
            "content": [ { "type": "text", "text": "Here you go: {\"builder\": \"Feadship\"}" } ]
        })))
        .mount(&server)
        .await;

    let client = LlmClient::with_base_url(&server.uri(), "test-key".into()).unwrap();
    let text = client.complete("fact sheet").await.unwrap();
    assert!(text.contains("Feadship"));
}
