//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end: robots.txt, fetching, classification, archiving,
//! event output and the run database.

use ls_crawler::config::{
    load_config_with_hash, load_site_lists, Config, CrawlSeed, CrawlerConfig, FilenamePolicy,
    OutputConfig, SeedsConfig, UserAgentConfig,
};
use ls_crawler::crawler::{run_crawl, CrawlEvent};
use ls_crawler::output::read_events;
use ls_crawler::storage::{RunStatus, SqliteStorage, Storage};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing everything below `dir`
fn create_test_config(dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            download_delay: 0,
            request_timeout: 5,
            obey_robots: true,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        seeds: SeedsConfig {
            site_lists: vec![],
        },
        output: OutputConfig {
            save_dir: dir.join("savedpages").to_string_lossy().into_owned(),
            events_path: dir.join("results.jsonl").to_string_lossy().into_owned(),
            database_path: dir.join("crawl.db").to_string_lossy().into_owned(),
            summary_path: dir.join("summary.md").to_string_lossy().into_owned(),
            filename_policy: FilenamePolicy::Legacy,
            text_width: 78,
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Host and port of the mock server, as used in homepage ids and file stems
fn authority(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

async fn crawl(config: &Config, seeds: &[CrawlSeed]) -> Vec<CrawlEvent> {
    run_crawl(config, "test_hash", seeds, CancellationToken::new())
        .await
        .expect("crawl failed");
    read_events(Path::new(&config.output.events_path)).expect("events unreadable")
}

#[tokio::test]
async fn test_full_crawl_finds_leichte_sprache() {
    let server = MockServer::start().await;
    let host = authority(&server);

    mount_page(
        &server,
        "/",
        html(
            r#"<html><body>
            <nav><a href="/ls/">Leichte Sprache</a></nav>
            <a href="/impressum">Impressum</a>
            <a href="/ls/heft.pdf">Heft in Leichter Sprache</a>
            </body></html>"#,
        ),
    )
    .await;
    mount_page(
        &server,
        "/ls/",
        html(
            r#"<html><body>
            <nav>Menü</nav>
            <main><h1>Willkommen</h1><p>Hier finden Sie Infos in Leichter Sprache.</p></main>
            </body></html>"#,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/impressum"))
        .respond_with(html("<p>Impressum</p>"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ls/heft.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seeds = vec![CrawlSeed::parse(&server.uri()).unwrap()];

    let events = crawl(&config, &seeds).await;

    assert_eq!(
        events,
        vec![
            CrawlEvent {
                start: true,
                start_url: host.clone(),
                url: format!("{}/", server.uri()),
                ls_sublinks: 2,
            },
            CrawlEvent {
                start: false,
                start_url: host.clone(),
                url: format!("{}/ls/", server.uri()),
                ls_sublinks: 0,
            },
        ]
    );

    let save_dir = dir.path().join("savedpages");
    let html_file = save_dir.join(format!("{}__.html", host));
    let txt_file = save_dir.join(format!("{}__.txt", host));
    assert!(std::fs::read_to_string(&html_file)
        .unwrap()
        .contains("<nav>Menü</nav>"));

    let text = std::fs::read_to_string(&txt_file).unwrap();
    assert!(text.starts_with(&format!("{}/ls/\n\n", server.uri())));
    assert!(text.contains("Willkommen"));
    assert!(!text.contains("Menü"));

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(storage.count_events(run.id, None).unwrap(), 2);
    assert_eq!(storage.count_archived_pages(run.id).unwrap(), 1);

    let summary = std::fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(summary.contains(&format!("| {} | 2 | 1 | 1 |", host)));
}

#[tokio::test]
async fn test_homepage_without_candidates() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        html(r#"<a href="/buergerservice">Bürgerservice</a><a href="http://example.org/leichte-sprache">Leichte Sprache</a>"#),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seeds = vec![CrawlSeed::parse(&server.uri()).unwrap()];

    let events = crawl(&config, &seeds).await;

    assert_eq!(events.len(), 1);
    assert!(events[0].start);
    assert_eq!(events[0].ls_sublinks, 0);
    assert_eq!(std::fs::read_dir(dir.path().join("savedpages")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_robots_txt_disallow_respected() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/robots.txt",
        ResponseTemplate::new(200)
            .set_body_string("User-agent: *\nDisallow: /ls/")
            .insert_header("content-type", "text/plain"),
    )
    .await;
    mount_page(&server, "/", html(r#"<a href="/ls/">Leichte Sprache</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/ls/"))
        .respond_with(html("<main>verboten</main>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seeds = vec![CrawlSeed::parse(&server.uri()).unwrap()];

    let events = crawl(&config, &seeds).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].ls_sublinks, 1);
}

#[tokio::test]
async fn test_non_html_homepage_ignored() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        ResponseTemplate::new(200)
            .set_body_bytes(b"%PDF-1.4 Leichte Sprache".to_vec())
            .insert_header("content-type", "application/pdf"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seeds = vec![CrawlSeed::parse(&server.uri()).unwrap()];

    let events = crawl(&config, &seeds).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_missing_subpage_yields_no_event() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html(r#"<a href="/ls/">Leichte Sprache</a>"#)).await;
    mount_page(&server, "/ls/", ResponseTemplate::new(404)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seeds = vec![CrawlSeed::parse(&server.uri()).unwrap()];

    let events = crawl(&config, &seeds).await;

    assert_eq!(events.len(), 1);
    assert!(events[0].start);
}

#[tokio::test]
async fn test_redirected_subpage_uses_final_url() {
    let server = MockServer::start().await;
    let host = authority(&server);

    mount_page(&server, "/", html(r#"<a href="/ls">Leichte Sprache</a>"#)).await;
    mount_page(
        &server,
        "/ls",
        ResponseTemplate::new(302).insert_header(
            "location",
            format!("{}/leichte-sprache/start.html?x=1", server.uri()).as_str(),
        ),
    )
    .await;
    mount_page(
        &server,
        "/leichte-sprache/start.html",
        html("<div id=\"main\"><p>Start</p></div>"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seeds = vec![CrawlSeed::parse(&server.uri()).unwrap()];

    let events = crawl(&config, &seeds).await;

    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1].url,
        format!("{}/leichte-sprache/start.html?x=1", server.uri())
    );
    assert!(dir
        .path()
        .join("savedpages")
        .join(format!("{}__start.txt", host))
        .exists());
}

#[tokio::test]
async fn test_crawl_from_config_files() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html(r#"<a href="/ls/">Leichte Sprache</a>"#)).await;
    mount_page(&server, "/ls/", html("<main>Hallo</main>")).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("sites.txt"),
        format!("# Testseiten\n\n{}\nmailto:nobody@example.org\n", server.uri()),
    )
    .unwrap();

    let config_toml = r#"
[crawler]
max-concurrent-requests = 2
download-delay = 0

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[seeds]
site-lists = ["sites.txt"]

[output]
save-dir = "SAVE_DIR"
events-path = "EVENTS_PATH"
database-path = "DB_PATH"
summary-path = "SUMMARY_PATH"
"#
    .replace("SAVE_DIR", &dir.path().join("savedpages").to_string_lossy())
    .replace("EVENTS_PATH", &dir.path().join("results.jsonl").to_string_lossy())
    .replace("DB_PATH", &dir.path().join("crawl.db").to_string_lossy())
    .replace("SUMMARY_PATH", &dir.path().join("summary.md").to_string_lossy());

    let config_path = dir.path().join("crawler.toml");
    std::fs::write(&config_path, config_toml).unwrap();

    let (config, hash) = load_config_with_hash(&config_path).unwrap();
    let seeds = load_site_lists(&config).unwrap();
    assert_eq!(seeds.len(), 1);

    run_crawl(&config, &hash, &seeds, CancellationToken::new())
        .await
        .unwrap();

    let events = read_events(Path::new(&config.output.events_path)).unwrap();
    assert_eq!(events.len(), 2);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, hash);
}

#[tokio::test]
async fn test_cancelled_crawl_marks_run_interrupted() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html(r#"<a href="/ls/">Leichte Sprache</a>"#)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seeds = vec![CrawlSeed::parse(&server.uri()).unwrap()];

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = run_crawl(&config, "test_hash", &seeds, cancel).await.unwrap();

    assert!(report.interrupted);
    assert_eq!(report.events, 0);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Interrupted);
}
