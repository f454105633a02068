//! Storage module for persisting crawl results
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking
//! - Crawl events and archived pages, queryable after the run

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens (creating if needed) the storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// A stored crawl event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: i64,
    pub run_id: i64,
    pub start: bool,
    pub start_url: String,
    pub url: String,
    pub ls_sublinks: u64,
    pub recorded_at: String,
}

/// A stored archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedPageRecord {
    pub id: i64,
    pub run_id: i64,
    pub start_url: String,
    pub url: String,
    pub file_stem: String,
    pub html_path: String,
    pub txt_path: String,
    pub main_matches: u64,
    pub archived_at: String,
}

/// Per-homepage totals for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomepageSummary {
    /// Homepage identifier (`start_url` of the events)
    pub homepage_id: String,

    /// Final URL the homepage was served from
    pub url: String,

    /// Candidate links found on the homepage
    pub ls_sublinks: u64,

    /// Sub-pages processed for this homepage
    pub subpages: u64,

    /// Sub-pages written to disk for this homepage
    pub archived: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether the run has ended
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Running)
    }
}
