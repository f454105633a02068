//! SQLite-backed event sink
//!
//! Records every event and archive entry in the crawl database so runs can
//! be inspected and summarised after the fact.

use crate::crawler::{ArchivedPage, CrawlEvent};
use crate::output::traits::{EventSink, OutputError, OutputResult};
use crate::storage::{RunStatus, Storage};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to a storage backend
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Writes crawl results into the storage backend under one run
pub struct SqliteEventSink {
    storage: SharedStorage,
    run_id: i64,
}

impl SqliteEventSink {
    /// Creates a sink recording into run `run_id`
    pub fn new(storage: SharedStorage, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
        self.storage
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))
    }
}

impl EventSink for SqliteEventSink {
    fn record_event(&self, event: &CrawlEvent) -> OutputResult<()> {
        self.lock()?
            .insert_event(self.run_id, event)
            .map_err(|e| OutputError::Storage(e.to_string()))?;
        Ok(())
    }

    fn record_archived(&self, homepage_id: &str, page: &ArchivedPage) -> OutputResult<()> {
        self.lock()?
            .insert_archived_page(self.run_id, homepage_id, page)
            .map_err(|e| OutputError::Storage(e.to_string()))?;
        Ok(())
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<()> {
        self.lock()?
            .update_run_status(self.run_id, status)
            .map_err(|e| OutputError::Storage(e.to_string()))
    }
}
