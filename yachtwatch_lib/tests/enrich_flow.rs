//! Enrichment pipeline against mocked sources: detail page, encyclopedia,
//! and owner biography, writing back through a real snapshot file.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yachtwatch_api::{LlmClient, RenderClient, WikiClient};
use yachtwatch_lib::config::EnrichConfig;
use yachtwatch_lib::enrich::{EnrichOptions, Enricher};
use yachtwatch_lib::{SnapshotStore, Vessel};

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn temp_snapshot() -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "yachtwatch-enrich-{}-{}.json",
        std::process::id(),
        n
    ))
}

fn fast_config() -> EnrichConfig {
    EnrichConfig {
        detail_delay: Duration::ZERO,
        wiki_delay: Duration::ZERO,
        owner_delay: Duration::ZERO,
        checkpoint_every: 1,
        wiki_min_length: 30,
    }
}

fn ghost() -> Vessel {
    Vessel {
        name: "GHOST".into(),
        vessel_id: "123".into(),
        length_meters: 77,
        lat: Some(17.9),
        lon: Some(-62.8),
        ..Default::default()
    }
}

const DETAIL_MD: &str = "\
| IMO | 9906633 |
| Year built | 2020 |
| Builder | Feadship |
| Detailed vessel type | Motor Yacht |
";

async fn mount_wiki_fixtures(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", "\"GHOST\" yacht"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "search": [
                { "title": "Ghost (yacht)", "snippet": "a luxury <b>motor yacht</b>", "pageid": 1 }
            ] }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "parse"))
        .and(query_param("page", "Ghost (yacht)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "parse": { "title": "Ghost (yacht)", "wikitext": {
                "*": "{{Infobox ship}}\n| Ship owner = [[Test Owner]]\n| Ship launched = 2020\n"
            } }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "extracts"))
        .and(query_param("titles", "Ghost (yacht)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": { "1": {
                "extract": "Ghost is a luxury motor yacht built by Feadship."
            } } }
        })))
        .mount(server)
        .await;

    mount_owner_bio(server).await;
}

async fn mount_owner_bio(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", "Test Owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "search": [
                { "title": "Test Owner", "snippet": "an investor", "pageid": 2 }
            ] }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "extracts"))
        .and(query_param("titles", "Test Owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": { "2": {
                "extract": "Test Owner is an American billionaire investor. According to \
                            Forbes his net worth is estimated at $5 billion."
            } } }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_pipeline_fills_gaps_and_writes_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_MD))
        .mount(&server)
        .await;
    mount_wiki_fixtures(&server).await;

    let store = SnapshotStore::new(temp_snapshot());
    store.save(&[ghost()]).unwrap();

    let render = RenderClient::with_urls(&server.uri(), "detail/").unwrap();
    let wiki = WikiClient::with_base_url(&server.uri()).unwrap();
    let enricher = Enricher::new(&render, &wiki, None, fast_config());

    let report = enricher
        .run(&store, &EnrichOptions::default())
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.detail_hits, 1);
    assert_eq!(report.wiki_pages_found, 1);
    assert_eq!(report.owners_resolved, 1);

    let saved = store.load().unwrap();
    let ghost = &saved[0];
    assert_eq!(ghost.imo, "9906633");
    assert_eq!(ghost.builder, "Feadship");
    assert_eq!(ghost.year_built, 2020);
    assert_eq!(ghost.detailed_type, "Motor Yacht");
    assert!(ghost.wikipedia_url.ends_with("/wiki/Ghost_(yacht)"));
    assert_eq!(ghost.owner.name, "Test Owner");
    assert!(!ghost.owner.business_summary.is_empty());
    assert_eq!(ghost.owner.net_worth.as_deref(), Some("$5 billion"));
    // Live telemetry is untouched by enrichment.
    assert_eq!(ghost.lat, Some(17.9));

    let _ = std::fs::remove_file(store.path());
}

#[tokio::test]
async fn dry_run_never_writes_the_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_MD))
        .mount(&server)
        .await;
    mount_wiki_fixtures(&server).await;

    let store = SnapshotStore::new(temp_snapshot());
    let original = vec![ghost()];
    store.save(&original).unwrap();

    let render = RenderClient::with_urls(&server.uri(), "detail/").unwrap();
    let wiki = WikiClient::with_base_url(&server.uri()).unwrap();
    let enricher = Enricher::new(&render, &wiki, None, fast_config());

    let opts = EnrichOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = enricher.run(&store, &opts).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.checkpoints, 0);
    assert_eq!(store.load().unwrap(), original);

    let _ = std::fs::remove_file(store.path());
}

#[tokio::test]
async fn second_pass_over_an_enriched_snapshot_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_MD))
        .mount(&server)
        .await;
    mount_wiki_fixtures(&server).await;

    let store = SnapshotStore::new(temp_snapshot());
    store.save(&[ghost()]).unwrap();

    let render = RenderClient::with_urls(&server.uri(), "detail/").unwrap();
    let wiki = WikiClient::with_base_url(&server.uri()).unwrap();
    let enricher = Enricher::new(&render, &wiki, None, fast_config());

    let first = enricher
        .run(&store, &EnrichOptions::default())
        .await
        .unwrap();
    assert_eq!(first.processed, 1);
    let after_first = std::fs::read(store.path()).unwrap();

    let second = enricher
        .run(&store, &EnrichOptions::default())
        .await
        .unwrap();
    assert_eq!(second.selected, 0);
    assert_eq!(second.processed, 0);
    assert_eq!(std::fs::read(store.path()).unwrap(), after_first);

    let _ = std::fs::remove_file(store.path());
}

#[tokio::test]
async fn owner_mode_discovers_owners_without_detail_fetches() {
    let server = MockServer::start().await;
    mount_wiki_fixtures(&server).await;

    // Complete on the descriptive anchors and below the usual wiki length
    // floor, so only owner-mode selection and the floor bypass reach the
    // encyclopedia at all.
    let mut vessel = ghost();
    vessel.imo = "9906633".into();
    vessel.builder = "Feadship".into();
    vessel.year_built = 2020;
    vessel.length_meters = 20;

    let store = SnapshotStore::new(temp_snapshot());
    store.save(&[vessel]).unwrap();

    let render = RenderClient::with_urls(&server.uri(), "detail/").unwrap();
    let wiki = WikiClient::with_base_url(&server.uri()).unwrap();
    let enricher = Enricher::new(&render, &wiki, None, fast_config());

    let opts = EnrichOptions {
        owners_only: true,
        ..Default::default()
    };
    let report = enricher.run(&store, &opts).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.detail_hits, 0);
    assert_eq!(report.detail_misses, 0);
    assert_eq!(report.wiki_pages_found, 1);
    assert_eq!(report.owners_resolved, 1);

    let saved = store.load().unwrap();
    assert_eq!(saved[0].owner.name, "Test Owner");
    assert!(!saved[0].owner.business_summary.is_empty());

    let _ = std::fs::remove_file(store.path());
}

#[tokio::test]
async fn model_discovered_owner_gets_biography_followup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_MD))
        .mount(&server)
        .await;
    // No encyclopedia page for the vessel under either query variant.
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", "\"GHOST\" yacht"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "query": { "search": [] } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", "\"GHOST\" superyacht motor vessel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "query": { "search": [] } })),
        )
        .mount(&server)
        .await;
    mount_owner_bio(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "text", "text": "{\"ownerName\": \"Test Owner\"}" }
            ]
        })))
        .mount(&server)
        .await;

    let store = SnapshotStore::new(temp_snapshot());
    store.save(&[ghost()]).unwrap();

    let render = RenderClient::with_urls(&server.uri(), "detail/").unwrap();
    let wiki = WikiClient::with_base_url(&server.uri()).unwrap();
    let llm = LlmClient::with_base_url(&server.uri(), "test-key".into()).unwrap();
    let enricher = Enricher::new(&render, &wiki, Some(&llm), fast_config());

    let opts = EnrichOptions {
        use_llm: true,
        ..Default::default()
    };
    let report = enricher.run(&store, &opts).await.unwrap();
    assert_eq!(report.llm_enriched, 1);
    assert_eq!(report.owners_resolved, 1);

    let saved = store.load().unwrap();
    let ghost = &saved[0];
    assert_eq!(ghost.owner.name, "Test Owner");
    assert!(ghost.owner.wikipedia_url.ends_with("/wiki/Test_Owner"));
    assert!(!ghost.owner.business_summary.is_empty());
    assert_eq!(ghost.owner.net_worth.as_deref(), Some("$5 billion"));

    let _ = std::fs::remove_file(store.path());
}

#[tokio::test]
async fn stored_page_urls_do_not_count_as_fresh_finds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/detail/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_MD))
        .mount(&server)
        .await;
    mount_wiki_fixtures(&server).await;

    let mut vessel = ghost();
    vessel.wikipedia_url = "https://en.wikipedia.org/wiki/Ghost_(yacht)".into();

    let store = SnapshotStore::new(temp_snapshot());
    store.save(&[vessel]).unwrap();

    let render = RenderClient::with_urls(&server.uri(), "detail/").unwrap();
    let wiki = WikiClient::with_base_url(&server.uri()).unwrap();
    let enricher = Enricher::new(&render, &wiki, None, fast_config());

    let report = enricher
        .run(&store, &EnrichOptions::default())
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    // The page was revisited through the stored URL, not found by search.
    assert_eq!(report.wiki_pages_found, 0);
    assert_eq!(report.owners_resolved, 1);

    let saved = store.load().unwrap();
    assert_eq!(saved[0].owner.name, "Test Owner");
    assert_eq!(saved[0].year_built, 2020);

    let _ = std::fs::remove_file(store.path());
}

#[tokio::test]
async fn source_failures_degrade_without_aborting_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/123"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let store = SnapshotStore::new(temp_snapshot());
    store.save(&[ghost()]).unwrap();

    let render = RenderClient::with_urls(&server.uri(), "detail/").unwrap();
    let wiki = WikiClient::with_base_url(&server.uri()).unwrap();
    let enricher = Enricher::new(&render, &wiki, None, fast_config());

    let report = enricher
        .run(&store, &EnrichOptions::default())
        .await
        .unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.detail_misses, 1);
    assert_eq!(report.wiki_pages_found, 0);

    // The pass still completes its final write-back.
    assert_eq!(store.load().unwrap(), vec![ghost()]);

    let _ = std::fs::remove_file(store.path());
}
