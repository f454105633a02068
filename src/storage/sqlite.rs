//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{ArchivedPage, CrawlEvent};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ArchivedPageRecord, EventRecord, HomepageSummary, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = if status.is_finished() {
            let now = Utc::now().to_rfc3339();
            self.conn.execute(
                "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
                params![status.to_db_string(), now, run_id],
            )?
        } else {
            self.conn.execute(
                "UPDATE runs SET status = ?1 WHERE id = ?2",
                params![status.to_db_string(), run_id],
            )?
        };

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Results =====

    fn insert_event(&mut self, run_id: i64, event: &CrawlEvent) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO events (run_id, start, start_url, url, ls_sublinks, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                event.start,
                event.start_url,
                event.url,
                event.ls_sublinks as i64,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_archived_page(
        &mut self,
        run_id: i64,
        start_url: &str,
        page: &ArchivedPage,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO archived_pages
             (run_id, start_url, url, file_stem, html_path, txt_path, main_matches, archived_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                start_url,
                page.url,
                page.file_stem,
                page.html_path.to_string_lossy().into_owned(),
                page.txt_path.to_string_lossy().into_owned(),
                page.main_matches as i64,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_events(&self, run_id: i64) -> StorageResult<Vec<EventRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, start, start_url, url, ls_sublinks, recorded_at
             FROM events WHERE run_id = ?1 ORDER BY id",
        )?;

        let events = stmt
            .query_map(params![run_id], |row| {
                Ok(EventRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    start: row.get(2)?,
                    start_url: row.get(3)?,
                    url: row.get(4)?,
                    ls_sublinks: row.get::<_, i64>(5)? as u64,
                    recorded_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    fn get_archived_pages(&self, run_id: i64) -> StorageResult<Vec<ArchivedPageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, start_url, url, file_stem, html_path, txt_path, main_matches, archived_at
             FROM archived_pages WHERE run_id = ?1 ORDER BY id",
        )?;

        let pages = stmt
            .query_map(params![run_id], |row| {
                Ok(ArchivedPageRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    start_url: row.get(2)?,
                    url: row.get(3)?,
                    file_stem: row.get(4)?,
                    html_path: row.get(5)?,
                    txt_path: row.get(6)?,
                    main_matches: row.get::<_, i64>(7)? as u64,
                    archived_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    // ===== Statistics =====

    fn count_events(&self, run_id: i64, start: Option<bool>) -> StorageResult<u64> {
        match start {
            Some(true) => self.count(
                "SELECT COUNT(*) FROM events WHERE run_id = ?1 AND start = 1",
                run_id,
            ),
            Some(false) => self.count(
                "SELECT COUNT(*) FROM events WHERE run_id = ?1 AND start = 0",
                run_id,
            ),
            None => self.count("SELECT COUNT(*) FROM events WHERE run_id = ?1", run_id),
        }
    }

    fn count_homepages_with_candidates(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM events WHERE run_id = ?1 AND start = 1 AND ls_sublinks > 0",
            run_id,
        )
    }

    fn count_archived_pages(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM archived_pages WHERE run_id = ?1",
            run_id,
        )
    }

    fn homepage_summaries(&self, run_id: i64) -> StorageResult<Vec<HomepageSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.start_url, h.url, h.ls_sublinks,
                (SELECT COUNT(*) FROM events s
                 WHERE s.run_id = h.run_id AND s.start = 0 AND s.start_url = h.start_url),
                (SELECT COUNT(*) FROM archived_pages a
                 WHERE a.run_id = h.run_id AND a.start_url = h.start_url)
             FROM events h
             WHERE h.run_id = ?1 AND h.start = 1
             ORDER BY h.start_url",
        )?;

        let summaries = stmt
            .query_map(params![run_id], |row| {
                Ok(HomepageSummary {
                    homepage_id: row.get(0)?,
                    url: row.get(1)?,
                    ls_sublinks: row.get::<_, i64>(2)? as u64,
                    subpages: row.get::<_, i64>(3)? as u64,
                    archived: row.get::<_, i64>(4)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }
}
