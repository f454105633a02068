//! JSON Lines event output
//!
//! Every event becomes one line of JSON with exactly the fields `start`,
//! `start_url`, `url` and `ls_sublinks`.

use crate::crawler::{ArchivedPage, CrawlEvent};
use crate::output::traits::{EventSink, OutputError, OutputResult};
use crate::storage::RunStatus;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Appends events to a JSON Lines file
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Opens `path` for appending, creating it if needed
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn lock(&self) -> OutputResult<std::sync::MutexGuard<'_, BufWriter<File>>> {
        self.writer
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock event file: {}", e)))
    }
}

impl EventSink for JsonLinesSink {
    fn record_event(&self, event: &CrawlEvent) -> OutputResult<()> {
        let line = serde_json::to_string(event)?;
        let mut writer = self.lock()?;
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    fn record_archived(&self, _homepage_id: &str, _page: &ArchivedPage) -> OutputResult<()> {
        Ok(())
    }

    fn finalize(&self, _status: RunStatus) -> OutputResult<()> {
        self.lock()?.flush()?;
        Ok(())
    }
}

/// Reads events back from a JSON Lines file, skipping blank lines
pub fn read_events(path: &Path) -> OutputResult<Vec<CrawlEvent>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(OutputError::from))
        .collect()
}
