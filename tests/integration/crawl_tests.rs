//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run complete
//! crawls against them end-to-end.

use std::time::{Duration, Instant};
use tempfile::tempdir;
use tidepool::config::Config;
use tidepool::output::{MemorySink, OutputRecord};
use tidepool::{CrawlRun, FetchStatus, RunStats};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HTML: &str = "text/html; charset=utf-8";

/// Creates a test configuration with a short run loop tick
fn create_test_config(max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.tick_millis = 50;
    config
}

/// An HTML page comfortably above the parse floor, linking to `links`
fn html_page(links: &[String]) -> String {
    html_page_with_filler(links, 20)
}

fn html_page_with_filler(links: &[String], filler: usize) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!("<a href=\"{}\">{}</a>\n", l, l))
        .collect();
    format!(
        "<html><head><title>Test</title></head><body>\n{}<p>{}</p>\n</body></html>",
        anchors,
        "filler text ".repeat(filler)
    )
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, HTML)
}

/// Mounts a leaf page that links nowhere
async fn mount_leaf(server: &MockServer, page: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_response(html_page(&[])))
        .mount(server)
        .await;
}

/// Mounts a page that must never be requested
async fn mount_forbidden(server: &MockServer, page: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_response(html_page(&[])))
        .expect(0)
        .mount(server)
        .await;
}

async fn run_with_memory_sink(config: Config, seed: &str) -> (RunStats, MemorySink) {
    let run = CrawlRun::new(config);
    let mut sink = MemorySink::new();
    let stats = run
        .execute_with_sink(seed, &mut sink)
        .await
        .expect("Crawl failed");
    (stats, sink)
}

/// Every completed fetch has exactly one record and ordinals are 0..completed
fn assert_contiguous(stats: &RunStats, sink: &MemorySink) {
    let mut ordinals: Vec<usize> = sink.all().iter().map(|r| r.ordinal).collect();
    ordinals.sort_unstable();
    let expected: Vec<usize> = (0..stats.completed).collect();
    assert_eq!(ordinals, expected);
}

#[tokio::test]
async fn test_seed_not_found_records_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", base_url);
    let (stats, sink) = run_with_memory_sink(create_test_config(2), &seed).await;

    assert_eq!(stats.completed, 1);
    assert_eq!(stats.scheduled_total, 1);
    assert_eq!(stats.pages_expanded, 0);
    assert!(!stats.cancelled);
    assert_eq!(
        sink.records,
        vec![OutputRecord::new(0, seed, FetchStatus::Http(404))]
    );
    assert!(sink.failures.is_empty());
    assert!(sink.closed);
}

#[tokio::test]
async fn test_max_depth_zero_fetches_only_seed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(html_page(&[
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ])))
        .mount(&mock_server)
        .await;
    mount_forbidden(&mock_server, "/page1").await;
    mount_forbidden(&mock_server, "/page2").await;

    let (stats, sink) = run_with_memory_sink(create_test_config(0), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 1);
    assert_eq!(stats.scheduled_total, 1);
    assert_eq!(stats.links_admitted, 0);
    assert_eq!(sink.records.len(), 1);
}

#[tokio::test]
async fn test_three_anchors_admit_at_most_three() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: Vec<String> = ["a", "b", "c"]
        .iter()
        .map(|p| format!("{}/{}", base_url, p))
        .collect();
    let body = html_page_with_filler(&links, 420);
    assert!(body.len() >= 5000);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(body))
        .mount(&mock_server)
        .await;
    for page in ["/a", "/b", "/c"] {
        mount_leaf(&mock_server, page).await;
    }

    let mut config = create_test_config(2);
    config.crawler.max_link_per_page = 5;
    let (stats, sink) = run_with_memory_sink(config, &format!("{}/", base_url)).await;

    assert!(stats.links_admitted <= 3);
    assert_eq!(stats.completed, 1 + stats.links_admitted);
    assert_eq!(stats.scheduled_total, stats.completed);
    assert_eq!(stats.abandoned, 0);
    assert_contiguous(&stats, &sink);

    // The seed always completes first: nothing else is pending until it does
    assert_eq!(sink.all()[0].url, format!("{}/", base_url));
    for record in sink.all().iter().skip(1) {
        assert!(links.contains(&record.url));
    }
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Create a chain: / -> level1 -> level2 -> level3
    let chain = [
        ("/", "/level1"),
        ("/level1", "/level2"),
        ("/level2", "/level3"),
    ];
    for (page, next) in chain {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html_response(html_page(&[format!("{}{}", base_url, next)])))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    mount_forbidden(&mock_server, "/level3").await;

    let (stats, sink) = run_with_memory_sink(create_test_config(2), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 3);
    assert_eq!(stats.scheduled_total, 3);
    // the page at max depth is fetched but never parsed
    assert_eq!(stats.pages_expanded, 2);
    let urls: Vec<&str> = sink.all().iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/level1", base_url),
            format!("{}/level2", base_url),
        ]
    );
}

#[tokio::test]
async fn test_non_html_response_not_expanded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                html_page(&[format!("{}/linked", base_url)]),
                "application/json",
            ),
        )
        .mount(&mock_server)
        .await;
    mount_forbidden(&mock_server, "/linked").await;

    let (stats, sink) = run_with_memory_sink(create_test_config(3), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pages_expanded, 0);
    assert_eq!(sink.records.len(), 1);
}

#[tokio::test]
async fn test_tiny_body_not_expanded() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let body = format!("<a href=\"{}/linked\">x</a>", base_url);
    assert!(body.len() <= 100);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(body))
        .mount(&mock_server)
        .await;
    mount_forbidden(&mock_server, "/linked").await;

    let (stats, _sink) = run_with_memory_sink(create_test_config(3), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pages_expanded, 0);
}

#[tokio::test]
async fn test_connection_failure_is_recorded_separately() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Nothing listens on the discard port on loopback
    let dead_link = "http://127.0.0.1:9/unreachable-page".to_string();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(html_page(&[dead_link.clone()])))
        .mount(&mock_server)
        .await;

    let (stats, sink) = run_with_memory_sink(create_test_config(1), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(sink.records.len(), 1);
    assert_eq!(sink.failures.len(), 1);
    assert_eq!(sink.failures[0].ordinal, 1);
    assert_eq!(sink.failures[0].url, dead_link);
    assert_eq!(
        sink.failures[0].to_string(),
        format!("[1] Connection failure: {}", dead_link)
    );
    assert_contiguous(&stats, &sink);
}

#[tokio::test]
async fn test_record_uses_effective_url_after_redirect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let target = format!("{}/final", base_url);
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", target.as_str()))
        .mount(&mock_server)
        .await;
    mount_leaf(&mock_server, "/final").await;

    let (stats, sink) = run_with_memory_sink(create_test_config(0), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 1);
    assert_eq!(
        sink.records,
        vec![OutputRecord::new(0, target, FetchStatus::Http(200))]
    );
}

#[tokio::test]
async fn test_failure_after_redirect_records_target_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let dead_target = "http://127.0.0.1:9/dead-target-page";
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", dead_target))
        .mount(&mock_server)
        .await;

    let (stats, sink) = run_with_memory_sink(create_test_config(0), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert!(sink.records.is_empty());
    assert_eq!(
        sink.failures[0].to_string(),
        format!("[0] Connection failure: {}", dead_target)
    );
}

#[tokio::test]
async fn test_total_budget_caps_scheduling() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: Vec<String> = (0..10).map(|i| format!("{}/p{}", base_url, i)).collect();
    Mock::given(method("GET"))
        .and(path_regex(r"^/(p\d+)?$"))
        .respond_with(html_response(html_page(&links)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(5);
    config.crawler.max_total = 4;
    let (stats, sink) = run_with_memory_sink(config, &format!("{}/", base_url)).await;

    assert_eq!(stats.scheduled_total, 4);
    assert_eq!(stats.completed, 4);
    assert_eq!(stats.abandoned, 0);
    assert_contiguous(&stats, &sink);
}

#[tokio::test]
async fn test_in_flight_budget_caps_admissions() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: Vec<String> = (0..10).map(|i| format!("{}/p{}", base_url, i)).collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(html_page(&links)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/p\d+$"))
        .respond_with(html_response(html_page(&[])))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(1);
    config.crawler.max_requests = 2;
    let (stats, _sink) = run_with_memory_sink(config, &format!("{}/", base_url)).await;

    assert_eq!(stats.links_admitted, 2);
    assert_eq!(stats.completed, 3);
}

#[tokio::test]
async fn test_relative_links_ignored_without_resolution() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(html_page(&["/relative-target-page".to_string()])))
        .mount(&mock_server)
        .await;
    mount_forbidden(&mock_server, "/relative-target-page").await;

    let (stats, _sink) = run_with_memory_sink(create_test_config(1), &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 1);
    assert_eq!(stats.pages_expanded, 1);
    assert_eq!(stats.links_admitted, 0);
}

#[tokio::test]
async fn test_relative_links_followed_when_resolving() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(html_page(&["/relative-target-page".to_string()])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/relative-target-page"))
        .respond_with(html_response(html_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(1);
    config.crawler.follow_relative_links = true;
    let (stats, sink) = run_with_memory_sink(config, &format!("{}/", base_url)).await;

    assert_eq!(stats.completed, 2);
    assert_eq!(
        sink.all()[1].url,
        format!("{}/relative-target-page", base_url)
    );
}

#[tokio::test]
async fn test_cancellation_abandons_pending_fetches() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: Vec<String> = (0..12).map(|i| format!("{}/slow/{}", base_url, i)).collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(html_page(&links)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/slow/\d+$"))
        .respond_with(html_response(html_page(&[])).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(1);
    config.crawler.max_link_per_page = 20;
    config.fetch.timeout_secs = 30;

    let run = CrawlRun::new(config);
    let cancel = run.cancel_flag();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let mut sink = MemorySink::new();
    let stats = run
        .execute_with_sink(&format!("{}/", base_url), &mut sink)
        .await
        .expect("Crawl failed");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(stats.cancelled);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.abandoned, 12);
    assert_eq!(stats.scheduled_total, stats.completed + stats.abandoned);
    assert_eq!(sink.records.len(), 1);
    assert!(sink.closed);
    assert_contiguous(&stats, &sink);
}

#[tokio::test]
async fn test_file_sink_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(html_page(&[
            format!("{}/a", base_url),
            format!("{}/b", base_url),
        ])))
        .mount(&mock_server)
        .await;
    mount_leaf(&mock_server, "/a").await;
    mount_leaf(&mock_server, "/b").await;

    let dir = tempdir().unwrap();
    let sink_path = dir.path().join("datafile.txt");
    std::fs::write(&sink_path, "[0]: https://stale.example/\n").unwrap();

    let mut config = create_test_config(1);
    config.output.sink_path = sink_path.display().to_string();

    let run = CrawlRun::new(config);
    let stats = run
        .execute(&format!("{}/", base_url))
        .await
        .expect("Crawl failed");

    let content = std::fs::read_to_string(&sink_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(stats.completed, 3);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("[0]: {}/", base_url));
    for (i, line) in lines.iter().enumerate() {
        assert!(line.starts_with(&format!("[{}]: {}/", i, base_url)));
    }

    let mut shown = Vec::new();
    let count = run.display(&mut shown).unwrap();
    assert_eq!(count, 3);
    assert_eq!(String::from_utf8(shown).unwrap(), content);
}

#[tokio::test]
async fn test_runs_are_serialized() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", base_url);
    let run_a = CrawlRun::new(create_test_config(0));
    let run_b = CrawlRun::new(create_test_config(0));
    let mut sink_a = MemorySink::new();
    let mut sink_b = MemorySink::new();

    let (a, b) = tokio::join!(
        run_a.execute_with_sink(&seed, &mut sink_a),
        run_b.execute_with_sink(&seed, &mut sink_b)
    );
    let a = a.expect("first crawl failed");
    let b = b.expect("second crawl failed");

    let (a_end, b_end) = (a.finished_at.unwrap(), b.finished_at.unwrap());
    assert!(a_end <= b.started_at || b_end <= a.started_at);
    assert_eq!(sink_a.records.len(), 1);
    assert_eq!(sink_b.records.len(), 1);
}
