use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure, created once per run and immutable afterwards
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub seeds: SeedsConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_concurrency")]
    pub max_concurrent_requests: u32,

    /// Minimum time between two requests to the same host (milliseconds)
    #[serde(rename = "download-delay", default)]
    pub download_delay: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_timeout")]
    pub request_timeout: u64,

    /// Whether robots.txt rules are honoured
    #[serde(rename = "obey-robots", default = "default_true")]
    pub obey_robots: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Where the seed domains come from
#[derive(Debug, Clone, Deserialize)]
pub struct SeedsConfig {
    /// Site-list files, one URL or hostname per line.
    /// Relative paths are resolved against the config file's directory.
    #[serde(rename = "site-lists")]
    pub site_lists: Vec<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the archived `.html`/`.txt` pairs
    #[serde(rename = "save-dir", default = "default_save_dir")]
    pub save_dir: String,

    /// JSON Lines file receiving one crawl event per fetched page
    #[serde(rename = "events-path", default = "default_events_path")]
    pub events_path: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,

    /// How archive filenames are derived from page URLs
    #[serde(rename = "filename-policy", default)]
    pub filename_policy: FilenamePolicy,

    /// Line width used when converting pages to text
    #[serde(rename = "text-width", default = "default_text_width")]
    pub text_width: usize,
}

/// Archive filename policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenamePolicy {
    /// `host__page`, exactly as downstream consumers expect; collisions overwrite
    #[default]
    Legacy,
    /// `host__page_<hash8>` with the page token truncated; collision resistant
    Hashed,
}

fn default_concurrency() -> u32 {
    16
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_save_dir() -> String {
    "savedpages".to_string()
}

fn default_events_path() -> String {
    "results.jsonl".to_string()
}

fn default_database_path() -> String {
    "crawl.db".to_string()
}

fn default_summary_path() -> String {
    "summary.md".to_string()
}

fn default_text_width() -> usize {
    78
}
