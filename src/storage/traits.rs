//! Storage traits and error types

use crate::crawler::{ArchivedPage, CrawlEvent};
use crate::storage::{ArchivedPageRecord, EventRecord, HomepageSummary, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("No crawl runs found in database")]
    NoRuns,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run; finished statuses also stamp `finished_at`
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Results =====

    /// Stores one crawl event
    fn insert_event(&mut self, run_id: i64, event: &CrawlEvent) -> StorageResult<i64>;

    /// Stores one archive entry for the homepage `start_url`
    fn insert_archived_page(
        &mut self,
        run_id: i64,
        start_url: &str,
        page: &ArchivedPage,
    ) -> StorageResult<i64>;

    /// All events of a run, in the order they were recorded
    fn get_events(&self, run_id: i64) -> StorageResult<Vec<EventRecord>>;

    /// All archive entries of a run, in the order they were recorded
    fn get_archived_pages(&self, run_id: i64) -> StorageResult<Vec<ArchivedPageRecord>>;

    // ===== Statistics =====

    /// Counts events of a run; `start` restricts to homepage or sub-page events
    fn count_events(&self, run_id: i64, start: Option<bool>) -> StorageResult<u64>;

    /// Counts homepages with at least one candidate link
    fn count_homepages_with_candidates(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts archive entries of a run
    fn count_archived_pages(&self, run_id: i64) -> StorageResult<u64>;

    /// Per-homepage totals, ordered by homepage identifier
    fn homepage_summaries(&self, run_id: i64) -> StorageResult<Vec<HomepageSummary>>;
}
