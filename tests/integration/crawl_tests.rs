//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a miniature copy of the country-sheet
//! site and run full collections against it end-to-end.

use ewaste_harvest::config::{
    Config, CrawlConfig, FetchConfig, OutputConfig, SampleConfig, SiteConfig,
};
use ewaste_harvest::crawler::{Coordinator, CrawlScope};
use ewaste_harvest::metrics::{Category, Metric};
use ewaste_harvest::output::export_records;
use ewaste_harvest::YearRecord;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server, with no pauses
fn create_test_config(server_uri: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: format!("{}/country-sheets/", server_uri),
            site_root: server_uri.to_string(),
        },
        fetch: FetchConfig {
            timeout_secs: 5,
            max_attempts: 2,
            backoff_base_ms: 10, // Very short for testing
            retry_statuses: vec![429, 500, 502, 503, 504],
        },
        crawl: CrawlConfig {
            year_delay_ms: 0,
            entity_delay_ms: 0,
            sample_entity_delay_ms: 0,
        },
        output: OutputConfig::default(),
        sample: SampleConfig::default(),
    }
}

fn listing_page(continents: &[(&str, &str)], countries: &[(&str, &str)]) -> String {
    let items = |links: &[(&str, &str)]| {
        links
            .iter()
            .map(|(name, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, name))
            .collect::<String>()
    };

    format!(
        r#"<html><body>
        <ul id="continent-list">{}</ul>
        <ul id="region-list"></ul>
        <ul id="country-list">{}</ul>
        </body></html>"#,
        items(continents),
        items(countries)
    )
}

fn detail_page(years: &[(&str, &str)]) -> String {
    let links: String = years
        .iter()
        .map(|(year, href)| format!(r#"<a class="yclick" href="{}">{}</a>"#, href, year))
        .collect();
    format!(r#"<html><body><div class="years">{}</div></body></html>"#, links)
}

fn year_page(population: &str, generated: &str) -> String {
    format!(
        r#"<html><body>
        <p class="pop-number">{}</p>
        <div class="upper-part">
          <div class="single-data"><h3>E-waste Generated</h3><p class="num bignum">{}</p></div>
          <div class="single-data"><h3>E-waste Collection Rate</h3>
            <svg viewBox="0 0 33 33">
              <text class="circle-chart__percent">46.9%</text>
            </svg></div>
          <div class="single-data"><h3>E-waste Imported</h3><p class="num middlenum">n/a</p></div>
        </div>
        <div class="bottom-part upper-part row">
          <div class="single-data">
            <h3>E-waste Generated per capita</h3><p class="num middlenum">17.6</p>
          </div>
        </div>
        </body></html>"#,
        population, generated
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn collect(server: &MockServer, scope: &CrawlScope) -> Vec<YearRecord> {
    let coordinator = Coordinator::new(create_test_config(&server.uri()), CancellationToken::new())
        .expect("Failed to create coordinator");
    coordinator.collect(scope).await
}

fn full_scope() -> CrawlScope {
    CrawlScope::Full { years: None }
}

#[tokio::test]
async fn test_single_continent_single_year() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(&[("Europe", "/europe")], &[]),
    )
    .await;
    mount_page(&mock_server, "/europe", detail_page(&[("2022", "/europe/2022")])).await;
    mount_page(&mock_server, "/europe/2022", year_page("744,000,000", "13,100")).await;

    let records = collect(&mock_server, &full_scope()).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.category, Category::Continent);
    assert_eq!(record.name, "Europe");
    assert_eq!(record.year, "2022");
    assert_eq!(record.population, Some(Metric::Value(744_000_000.0)));
    assert_eq!(record.generated_kt, Some(Metric::Value(13_100.0)));
    assert_eq!(record.collection_rate, Some(Metric::Value(46.9)));
    assert_eq!(record.imported_kt, Some(Metric::NotAvailable));
    assert_eq!(record.generated_per_capita, Some(Metric::Value(17.6)));
    assert_eq!(record.exported_kt, None);
    assert_eq!(record.put_on_market_kt, None);
    assert_eq!(record.source_url, format!("{}/europe/2022", mock_server.uri()));
}

#[tokio::test]
async fn test_relative_hrefs_resolve_from_site_root() {
    let mock_server = MockServer::start().await;

    // Listing lives under /country-sheets/, but bare hrefs are site-root paths
    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(&[], &[("Japan", "japan")]),
    )
    .await;
    mount_page(&mock_server, "/japan", detail_page(&[("2019", "japan/2019")])).await;
    mount_page(&mock_server, "/japan/2019", year_page("126,000,000", "2,569")).await;

    let records = collect(&mock_server, &full_scope()).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, Category::Country);
    assert_eq!(records[0].source_url, format!("{}/japan/2019", mock_server.uri()));
}

#[tokio::test]
async fn test_failing_entity_does_not_drop_others() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(
            &[("Africa", "/africa"), ("Europe", "/europe")],
            &[("Japan", "/japan")],
        ),
    )
    .await;

    // Africa's detail page keeps failing through every attempt
    Mock::given(method("GET"))
        .and(path("/africa"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/europe", detail_page(&[("2022", "/europe/2022")])).await;
    mount_page(&mock_server, "/europe/2022", year_page("744,000,000", "13,100")).await;
    mount_page(
        &mock_server,
        "/japan",
        detail_page(&[("2022", "/japan/2022"), ("2019", "/japan/2019")]),
    )
    .await;
    mount_page(&mock_server, "/japan/2022", year_page("125,000,000", "2,600")).await;
    // Missing year page: a 404 costs only that year
    Mock::given(method("GET"))
        .and(path("/japan/2019"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let records = collect(&mock_server, &full_scope()).await;

    let found: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.name.as_str(), r.year.as_str()))
        .collect();
    assert_eq!(found, vec![("Europe", "2022"), ("Japan", "2022")]);
}

#[tokio::test]
async fn test_year_filter_without_match_continues_crawl() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(&[("Europe", "/europe")], &[("Japan", "/japan")]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/europe"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_page(&[("2022", "/europe/2022")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/japan"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(detail_page(&[("2022", "/japan/2022")])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    // No year page is ever requested
    Mock::given(method("GET"))
        .and(path("/europe/2022"))
        .respond_with(ResponseTemplate::new(200).set_body_string(year_page("1", "1")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scope = CrawlScope::Full {
        years: Some(["1999"].into_iter().collect()),
    };
    let records = collect(&mock_server, &scope).await;

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_all_absent_page_yields_no_record() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(&[("Oceania", "/oceania")], &[]),
    )
    .await;
    mount_page(&mock_server, "/oceania", detail_page(&[("2022", "/oceania/2022")])).await;
    mount_page(
        &mock_server,
        "/oceania/2022",
        r#"<html><body><div class="upper-part"><p>Data not published</p></div></body></html>"#
            .to_string(),
    )
    .await;

    let records = collect(&mock_server, &full_scope()).await;

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_listing_failure_returns_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/country-sheets/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let records = collect(&mock_server, &full_scope()).await;

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_sample_scope_limits_entities_and_years() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(
            &[("Africa", "/africa"), ("Europe", "/europe")],
            &[("Germany", "/germany")],
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/africa"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_page(
        &mock_server,
        "/europe",
        detail_page(&[
            ("2022", "/europe/2022"),
            ("2019", "/europe/2019"),
            ("2018", "/europe/2018"),
        ]),
    )
    .await;
    mount_page(&mock_server, "/europe/2022", year_page("744,000,000", "13,100")).await;
    mount_page(&mock_server, "/europe/2018", year_page("741,000,000", "12,000")).await;
    Mock::given(method("GET"))
        .and(path("/europe/2019"))
        .respond_with(ResponseTemplate::new(200).set_body_string(year_page("1", "1")))
        .expect(0)
        .mount(&mock_server)
        .await;

    // Germany is a sample target but offers none of the sample years
    mount_page(&mock_server, "/germany", detail_page(&[("2010", "/germany/2010")])).await;

    let coordinator = Coordinator::new(
        create_test_config(&mock_server.uri()),
        CancellationToken::new(),
    )
    .expect("Failed to create coordinator");
    let scope = coordinator.scope(true, vec![]);
    let records = coordinator.collect(&scope).await;

    let found: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.name.as_str(), r.year.as_str()))
        .collect();
    assert_eq!(found, vec![("Europe", "2022"), ("Europe", "2018")]);
}

#[tokio::test]
async fn test_cancelled_run_returns_without_visiting_entities() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(&[("Europe", "/europe")], &[]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/europe"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let coordinator = Coordinator::new(create_test_config(&mock_server.uri()), cancel)
        .expect("Failed to create coordinator");

    let records = coordinator.collect(&full_scope()).await;

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_collect_then_export() {
    let mock_server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(&[("Europe", "/europe")], &[]),
    )
    .await;
    mount_page(&mock_server, "/europe", detail_page(&[("2022", "/europe/2022")])).await;
    mount_page(&mock_server, "/europe/2022", year_page("744,000,000", "13,100")).await;

    let mut config = create_test_config(&mock_server.uri());
    config.output.directory = temp_dir.path().to_string_lossy().into_owned();

    let coordinator = Coordinator::new(config.clone(), CancellationToken::new())
        .expect("Failed to create coordinator");
    let records = coordinator.collect(&full_scope()).await;
    let paths = export_records(&records, &config.output, false).expect("Export failed");

    assert_eq!(paths.len(), 2);

    let csv = std::fs::read_to_string(&paths[0]).expect("Failed to read CSV");
    let mut lines = csv.trim_start_matches('\u{FEFF}').lines();
    assert!(lines.next().unwrap().starts_with("Category,Name,Year,Population,"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("Continent,Europe,2022,744000000.0,13100.0,"));
    assert!(row.ends_with(&format!(",n/a,,{}/europe/2022", mock_server.uri())));
    assert!(lines.next().is_none());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths[1]).expect("Failed to read JSON"))
            .expect("Invalid JSON");
    assert_eq!(json.as_array().map(Vec::len), Some(1));
    assert_eq!(json[0]["E-waste Collection Rate (%)"], 46.9);
    assert!(json[0]["E-waste Exported (kt)"].is_null());
}

#[tokio::test]
async fn test_interrupt_mid_crawl_keeps_earlier_records() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/country-sheets/",
        listing_page(&[("Europe", "/europe")], &[("Japan", "/japan")]),
    )
    .await;
    mount_page(&mock_server, "/europe", detail_page(&[("2022", "/europe/2022")])).await;
    mount_page(&mock_server, "/europe/2022", year_page("744,000,000", "13,100")).await;
    Mock::given(method("GET"))
        .and(path("/japan"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.crawl.entity_delay_ms = 10_000;

    let cancel = CancellationToken::new();
    let coordinator =
        Coordinator::new(config, cancel.clone()).expect("Failed to create coordinator");

    // Lands during the pause after the first entity
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let records = coordinator.collect(&full_scope()).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    let found: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.name.as_str(), r.year.as_str()))
        .collect();
    assert_eq!(found, vec![("Europe", "2022")]);
}

#[tokio::test]
async fn test_interrupt_during_long_retry_wait() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/country-sheets/"))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "3600"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    let coordinator = Coordinator::new(create_test_config(&mock_server.uri()), cancel.clone())
        .expect("Failed to create coordinator");

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let records = tokio::time::timeout(Duration::from_secs(5), coordinator.collect(&full_scope()))
        .await
        .expect("Collection did not stop on interrupt");

    assert!(records.is_empty());
}
