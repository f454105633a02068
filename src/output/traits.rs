//! Output sink traits and types
//!
//! This module defines the trait interface for event sinks and the data
//! structures used for crawl summaries.

use crate::crawler::{ArchivedPage, CrawlEvent};
use crate::storage::{HomepageSummary, RunStatus};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    // Totals
    pub homepages_crawled: u64,
    pub homepages_with_candidates: u64,
    pub subpages_fetched: u64,
    pub pages_archived: u64,

    // One row per homepage
    pub homepages: Vec<HomepageSummary>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of crawled homepages linking to Leichte Sprache, in percent
    pub fn candidate_rate(&self) -> f64 {
        if self.homepages_crawled == 0 {
            return 0.0;
        }
        (self.homepages_with_candidates as f64 / self.homepages_crawled as f64) * 100.0
    }
}

/// Receives crawl results as they are produced
///
/// Sinks are called from the crawl runtime one result at a time, in the
/// order the results were produced.
pub trait EventSink: Send {
    /// Records one crawl event
    fn record_event(&self, event: &CrawlEvent) -> OutputResult<()>;

    /// Records a page written to the save directory
    ///
    /// # Arguments
    ///
    /// * `homepage_id` - The seed the page descends from
    /// * `page` - The archived files
    fn record_archived(&self, homepage_id: &str, page: &ArchivedPage) -> OutputResult<()>;

    /// Flushes buffered output and records the final run status
    fn finalize(&self, status: RunStatus) -> OutputResult<()>;
}
