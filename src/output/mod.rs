//! Output module for crawl results
//!
//! This module handles:
//! - Streaming crawl events to JSON Lines and SQLite sinks
//! - Computing statistics from the crawl database
//! - Generating markdown summaries

mod jsonl;
mod markdown;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::{read_events, JsonLinesSink};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sqlite_output::{SharedStorage, SqliteEventSink};
pub use stats::{load_run_statistics, load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, EventSink, OutputError, OutputResult};

use crate::storage::{Storage, StorageError};
use crate::CrawlerError;

/// Builds the summary of the most recent run
pub fn generate_summary(storage: &dyn Storage) -> Result<CrawlSummary, CrawlerError> {
    let run = storage.get_latest_run()?.ok_or(StorageError::NoRuns)?;

    let duration_seconds = match (
        run.started_at.parse::<chrono::DateTime<chrono::Utc>>(),
        run.finished_at
            .as_deref()
            .map(str::parse::<chrono::DateTime<chrono::Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    let stats = stats::load_run_statistics(storage, run.id)?;
    let homepages = storage.homepage_summaries(run.id)?;

    Ok(CrawlSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        homepages_crawled: stats.homepages_crawled,
        homepages_with_candidates: stats.homepages_with_candidates,
        subpages_fetched: stats.subpages_fetched,
        pages_archived: stats.pages_archived,
        homepages,
    })
}
