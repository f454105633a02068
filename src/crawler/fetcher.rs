//! HTTP fetching
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - Checking robots.txt before each request
//! - Spacing requests per host
//! - Classifying failures

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::scheduler::Politeness;
use crate::robots::RobotsCache;
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Most redirects followed for one request
const MAX_REDIRECTS: usize = 20;

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Body bytes as received
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Returns true when the response is text the crawler can parse
    ///
    /// Without a Content-Type the body is sniffed: no NUL bytes, and either
    /// valid UTF-8 or a `<meta>` charset declaration.
    pub fn is_textual(&self) -> bool {
        match &self.content_type {
            Some(content_type) => is_textual_content_type(content_type),
            None => {
                !self.body.contains(&0)
                    && (std::str::from_utf8(&self.body).is_ok()
                        || sniff_meta_charset(&self.body).is_some())
            }
        }
    }

    /// Character encoding of the body
    ///
    /// The Content-Type charset wins, then a `<meta>` declaration near the
    /// top of the document, then UTF-8.
    pub fn encoding(&self) -> &'static Encoding {
        self.content_type
            .as_deref()
            .and_then(charset_from_content_type)
            .or_else(|| sniff_meta_charset(&self.body))
            .unwrap_or(UTF_8)
    }

    /// The decoded body, or None for non-textual responses
    ///
    /// A byte order mark overrides the declared encoding; malformed
    /// sequences are replaced.
    pub fn text(&self) -> Option<String> {
        if !self.is_textual() {
            return None;
        }

        let (text, encoding, had_errors) = self.encoding().decode(&self.body);
        if had_errors {
            tracing::debug!("Malformed {} in <{}>", encoding.name(), self.url);
        }
        Some(text.into_owned())
    }
}

/// Returns true for text/*, XML and JSON media types
pub fn is_textual_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.starts_with("text/")
        || mime.ends_with("+xml")
        || mime == "application/xml"
        || mime == "application/json"
}

/// Encoding named by the `charset` parameter of a Content-Type value
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Encoding::for_label(value.trim().trim_matches(|c: char| c == '"' || c == '\'').as_bytes())
    })
}

/// Bytes of the document searched for a `<meta>` charset
const META_SNIFF_LEN: usize = 1024;

/// Encoding declared by `<meta charset=..>` or an http-equiv Content-Type
fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_LEN)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let mut rest = head.as_str();
    while let Some(meta) = rest.find("<meta") {
        rest = &rest[meta + 5..];
        let tag = &rest[..rest.find('>').unwrap_or(rest.len())];

        if let Some(pos) = tag.find("charset=") {
            let label = tag[pos + 8..]
                .trim_start_matches(|c: char| c == '"' || c == '\'')
                .split(|c: char| c == '"' || c == '\'' || c == ';' || c == '/' || c.is_whitespace())
                .next()
                .unwrap_or("");
            if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
                return Some(encoding);
            }
        }
    }
    None
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// 2xx response
    Page(FetchedPage),

    /// Non-2xx response
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Network error (connection refused, timeout, too many redirects, ...)
    NetworkError {
        /// Error description
        error: String,
    },

    /// robots.txt forbids the URL
    RobotsDenied,
}

/// Fetches pages for the crawl runtime
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchResult;
}

/// Builds the HTTP client
///
/// # Example
///
/// ```no_run
/// use ls_crawler::config::{CrawlerConfig, UserAgentConfig};
/// use ls_crawler::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "LeichteSpracheBot".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.org/bot".to_string(),
///     contact_email: "bot@example.org".to_string(),
/// };
/// let crawler = CrawlerConfig {
///     max_concurrent_requests: 16,
///     download_delay: 0,
///     request_timeout: 30,
///     obey_robots: true,
/// };
///
/// let client = build_http_client(&user_agent, &crawler).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends one GET request and classifies the outcome
pub async fn fetch_page(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(r) => r,
        Err(e) => return classify_error(url, e),
    };

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        tracing::debug!("HTTP {} for <{}>", status.as_u16(), url);
        return FetchResult::HttpError {
            status: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match response.bytes().await {
        Ok(body) => FetchResult::Page(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body: body.to_vec(),
        }),
        Err(e) => classify_error(url, e),
    }
}

fn classify_error(url: &Url, e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_redirect() {
        format!("Too many redirects: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };

    tracing::debug!("Fetching <{}> failed: {}", url, error);
    FetchResult::NetworkError { error }
}

/// The production fetcher: robots.txt, politeness, then a GET request
pub struct HttpFetcher {
    client: Client,
    robots: Option<RobotsCache>,
    politeness: Politeness,
    agent: String,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let robots = config
            .crawler
            .obey_robots
            .then(|| RobotsCache::new(client.clone()));

        Ok(Self {
            client,
            robots,
            politeness: Politeness::new(Duration::from_millis(config.crawler.download_delay)),
            agent: config.user_agent.crawler_name.clone(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        let host = match url.port() {
            Some(port) => format!("{}:{}", url.host_str().unwrap_or(""), port),
            None => url.host_str().unwrap_or("").to_string(),
        };

        if let Some(robots) = &self.robots {
            let rules = robots.rules_for(url).await;
            if !rules.is_allowed(url.as_str(), &self.agent) {
                tracing::info!("Forbidden by robots.txt: <{}>", url);
                return FetchResult::RobotsDenied;
            }
            self.politeness
                .set_crawl_delay(&host, rules.crawl_delay(&self.agent))
                .await;
        }

        self.politeness.wait_turn(&host).await;
        fetch_page(&self.client, url).await
    }
}
