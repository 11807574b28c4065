//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tabelog_crawler::config::Config;
use tabelog_crawler::crawler::{Coordinator, CrawlOutcome, HttpFetcher, RestaurantRecord};
use tabelog_crawler::output::{RecordSink, SinkResult, SqliteRecordSink};
use tabelog_crawler::storage::{RunStatus, SqliteStorage, Storage};
use tabelog_crawler::RunState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DETAIL_PATH: &str = "/tokyo/A1301/A130101/13000001";

/// Keeps every record in memory
#[derive(Default)]
struct CollectingSink {
    records: Mutex<Vec<RestaurantRecord>>,
}

impl RecordSink for CollectingSink {
    fn accept(&self, record: &RestaurantRecord) -> SinkResult<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Creates a test configuration rooted at the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.site.base_url = format!("{}/tokyo", server.uri());
    config.crawler.seed = format!("{}/tokyo", server.uri());
    config.crawler.delay_ms = 0;
    config.fetch.timeout_secs = 5;
    config
}

fn create_coordinator(config: Config, sink: Arc<dyn RecordSink>) -> Coordinator {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetch)
        .expect("Failed to build fetcher");
    Coordinator::new(config, Arc::new(fetcher), sink).expect("Failed to build coordinator")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn detail_page(name: &str, score: &str) -> ResponseTemplate {
    html(&format!(
        r#"<div class="rdheader-rstname"><h2><a href="{}"><span>{}</span></a></h2></div>
        <span class="rdheader-rating__score-val-dtl">{}</span>
        <table class="c-table"><tbody>
            <tr><th>Name</th><td>{}</td></tr>
            <tr><th>Reservation</th><td>Reservations only</td></tr>
            <tr><th>Genre</th><td>Sushi</td></tr>
            <tr><th>Phone</th><td>03-1234-5678</td></tr>
            <tr><th>Reservation</th><td>Available</td></tr>
            <tr><th>Address</th><td>Ginza 1-2-3</td></tr>
            <tr><th>Transport</th><td>Ginza station</td></tr>
            <tr><th>Hours</th><td>17:00 - 22:00</td></tr>
            <tr><th>Closed</th><td>Sunday</td></tr>
        </tbody></table>"#,
        DETAIL_PATH, name, score, name
    ))
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_seed_follows_listing_and_detail_only() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/tokyo",
        html(&format!(
            r#"<a href="/tokyo/rstLst/1">Listing</a>
               <a href="{}">Detail</a>
               <a href="/tokyo/help">Help</a>"#,
            DETAIL_PATH
        )),
        1,
    )
    .await;
    mount(&server, "/tokyo/rstLst/1", html("<p>no more</p>"), 1).await;
    mount(&server, DETAIL_PATH, detail_page("Sushi Ginza", "3.58"), 1).await;
    mount(&server, "/tokyo/help", html("<p>help</p>"), 0).await;

    let config = create_test_config(&server);
    let seed = config.crawler.seed.clone();
    let sink = Arc::new(CollectingSink::default());
    let coordinator = create_coordinator(config, sink.clone());

    let report = coordinator.run(&seed).await.expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::FrontierEmpty);
    assert_eq!(report.visited, 3);
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.stats.links_enqueued, 2);
    assert_eq!(coordinator.state(), RunState::Stopped);

    let records = sink.records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Sushi Ginza");
    assert!((records[0].score - 3.58).abs() < f64::EPSILON);
    assert_eq!(records[0].source_url, format!("{}{}", server.uri(), DETAIL_PATH));
}

#[tokio::test]
async fn test_budget_of_one_fetches_exactly_once() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/tokyo",
        html(r#"<a href="/tokyo/rstLst/1">1</a><a href="/tokyo/rstLst/2">2</a>"#),
        1,
    )
    .await;
    mount(&server, "/tokyo/rstLst/1", html(""), 0).await;
    mount(&server, "/tokyo/rstLst/2", html(""), 0).await;

    let mut config = create_test_config(&server);
    config.crawler.max_visits = 1;
    let seed = config.crawler.seed.clone();
    let coordinator = create_coordinator(config, Arc::new(CollectingSink::default()));

    let report = coordinator.run(&seed).await.expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::BudgetExhausted);
    assert_eq!(report.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_budget_spent_on_last_page_reports_exhausted() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/tokyo",
        html(r#"<a href="/tokyo/rstLst/1">Listing</a>"#),
        1,
    )
    .await;
    mount(
        &server,
        "/tokyo/rstLst/1",
        html(&format!(r#"<a href="{}">Detail</a>"#, DETAIL_PATH)),
        1,
    )
    .await;
    mount(&server, DETAIL_PATH, detail_page("Sushi Ginza", "3.58"), 1).await;

    let mut config = create_test_config(&server);
    config.crawler.max_visits = 3;
    let seed = config.crawler.seed.clone();
    let sink = Arc::new(CollectingSink::default());
    let coordinator = create_coordinator(config, sink.clone());

    let report = coordinator.run(&seed).await.expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::BudgetExhausted);
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(sink.records.lock().len(), 1);
}

#[tokio::test]
async fn test_shared_detail_fetched_once_with_two_workers() {
    let server = MockServer::start().await;
    let detail_link = format!(r#"<a href="{}">Shared</a>"#, DETAIL_PATH);

    mount(
        &server,
        "/tokyo",
        html(r#"<a href="/tokyo/rstLst/1">1</a><a href="/tokyo/rstLst/2">2</a>"#),
        1,
    )
    .await;
    mount(&server, "/tokyo/rstLst/1", html(&detail_link), 1).await;
    mount(&server, "/tokyo/rstLst/2", html(&detail_link), 1).await;
    mount(&server, DETAIL_PATH, detail_page("Tempura Ten", "-"), 1).await;

    let mut config = create_test_config(&server);
    config.crawler.workers = 2;
    let seed = config.crawler.seed.clone();
    let sink = Arc::new(CollectingSink::default());
    let coordinator = create_coordinator(config, sink.clone());

    let report = coordinator.run(&seed).await.expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::FrontierEmpty);
    assert_eq!(report.stats.pages_fetched, 4);

    let records = sink.records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].score, 0.0);
}

#[tokio::test]
async fn test_failed_pages_do_not_abort_the_run() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/tokyo",
        html(&format!(
            r#"<a href="/tokyo/rstLst/1">broken</a>
               <a href="/tokyo/rstLst/2">pdf</a>
               <a href="{}">detail</a>"#,
            DETAIL_PATH
        )),
        1,
    )
    .await;
    mount(&server, "/tokyo/rstLst/1", ResponseTemplate::new(500), 1).await;
    mount(
        &server,
        "/tokyo/rstLst/2",
        ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"),
        1,
    )
    .await;
    mount(&server, DETAIL_PATH, detail_page("Soba Kanda", "3.10"), 1).await;

    let config = create_test_config(&server);
    let seed = config.crawler.seed.clone();
    let sink = Arc::new(CollectingSink::default());
    let coordinator = create_coordinator(config, sink.clone());

    let report = coordinator.run(&seed).await.expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::FrontierEmpty);
    assert_eq!(report.stats.fetch_errors, 1);
    assert_eq!(report.stats.parse_errors, 1);
    assert_eq!(sink.records.lock().len(), 1);
}

#[tokio::test]
async fn test_detail_pages_are_not_expanded() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/tokyo",
        html(&format!(r#"<a href="{}">detail</a>"#, DETAIL_PATH)),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path(DETAIL_PATH))
        .respond_with(html(
            r#"<h2><a href="/"><span>Izakaya</span></a></h2>
               <a href="/tokyo/rstLst/9">more</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount(&server, "/tokyo/rstLst/9", html(""), 0).await;

    let config = create_test_config(&server);
    let seed = config.crawler.seed.clone();
    let sink = Arc::new(CollectingSink::default());
    let coordinator = create_coordinator(config, sink.clone());

    let report = coordinator.run(&seed).await.expect("Crawl failed");

    assert_eq!(report.stats.pages_fetched, 2);
    let records = sink.records.lock();
    assert_eq!(records[0].name, "Izakaya");
    assert_eq!(records[0].genre, "");
    assert!(report.stats.degraded_fields > 0);
}

#[tokio::test]
async fn test_records_persisted_to_sqlite() {
    let server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("restaurants.db");

    mount(
        &server,
        "/tokyo",
        html(r#"<a href="/tokyo/rstLst/1">1</a>"#),
        1,
    )
    .await;
    mount(
        &server,
        "/tokyo/rstLst/1",
        html(&format!(r#"<a href="{}">d</a><a href="/tokyo">top</a>"#, DETAIL_PATH)),
        1,
    )
    .await;
    mount(&server, DETAIL_PATH, detail_page("Sushi Ginza", "3.58"), 1).await;

    let config = create_test_config(&server);
    let seed = config.crawler.seed.clone();
    let sink = SqliteRecordSink::open(&db_path, "test-hash").expect("Failed to open sink");
    let coordinator = create_coordinator(config, Arc::new(sink));

    coordinator.run(&seed).await.expect("Crawl failed");

    let storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    assert_eq!(storage.count_restaurants().unwrap(), 1);

    let stored = storage
        .get_restaurant(&format!("{}{}", server.uri(), DETAIL_PATH))
        .unwrap()
        .expect("Restaurant should be stored");
    assert_eq!(stored.name, "Sushi Ginza");
    assert_eq!(stored.genre, "Sushi");
    assert_eq!(stored.address, "Ginza 1-2-3");
    assert_eq!(stored.holiday, "Sunday");

    let run = storage.get_latest_run().unwrap().expect("Run should exist");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.pages_fetched, 3);
    assert_eq!(run.records_emitted, 1);
}

#[tokio::test]
async fn test_cancellation_stops_pending_fetches() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/tokyo",
        html(r#"<a href="/tokyo/rstLst/1">1</a>"#),
        1,
    )
    .await;
    mount(&server, "/tokyo/rstLst/1", html(""), 0).await;

    let mut config = create_test_config(&server);
    config.crawler.delay_ms = 60_000;
    let seed = config.crawler.seed.clone();
    let coordinator = Arc::new(create_coordinator(
        config,
        Arc::new(CollectingSink::default()),
    ));
    let token = coordinator.cancellation_token();

    let handle = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run(&seed).await })
    };

    // Wait for the seed fetch, then stop while the worker is pacing
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    token.cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Run did not stop after cancellation")
        .expect("Run task panicked")
        .expect("Crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::Cancelled);
    assert_eq!(report.stats.pages_fetched, 1);
}
