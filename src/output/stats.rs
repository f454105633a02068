//! Statistics from the crawl database

use crate::storage::{Storage, StorageError};
use crate::CrawlerError;

/// Crawl statistics for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    pub run_id: i64,

    /// Homepages that produced an event
    pub homepages_crawled: u64,

    /// Homepages with at least one candidate link
    pub homepages_with_candidates: u64,

    /// Sub-pages that produced an event
    pub subpages_fetched: u64,

    /// Sub-pages written to the save directory
    pub pages_archived: u64,
}

/// Loads statistics for the most recent run
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, CrawlerError> {
    let run = storage.get_latest_run()?.ok_or(StorageError::NoRuns)?;
    load_run_statistics(storage, run.id)
}

/// Loads statistics for run `run_id`
pub fn load_run_statistics(
    storage: &dyn Storage,
    run_id: i64,
) -> Result<CrawlStatistics, CrawlerError> {
    Ok(CrawlStatistics {
        run_id,
        homepages_crawled: storage.count_events(run_id, Some(true))?,
        homepages_with_candidates: storage.count_homepages_with_candidates(run_id)?,
        subpages_fetched: storage.count_events(run_id, Some(false))?,
        pages_archived: storage.count_archived_pages(run_id)?,
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics (run {}) ===\n", stats.run_id);

    println!("Homepages:");
    println!("  Crawled: {}", stats.homepages_crawled);

    let rate = if stats.homepages_crawled > 0 {
        (stats.homepages_with_candidates as f64 / stats.homepages_crawled as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "  Linking to Leichte Sprache: {} ({:.1}%)",
        stats.homepages_with_candidates, rate
    );
    println!();

    println!("Sub-pages:");
    println!("  Fetched: {}", stats.subpages_fetched);
    println!("  Archived: {}", stats.pages_archived);
}
