//! Page archiving
//!
//! Every fetched sub-page is written twice into the save directory:
//! `<stem>.html` holds the raw bytes as received, `<stem>.txt` holds the page
//! URL, a blank line, and the plain text of the page's main content.

use crate::config::FilenamePolicy;
use crate::crawler::converter::TextConverter;
use crate::ArchiveError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Longest page token kept by the hashed policy (bytes)
const MAX_PAGE_TOKEN: usize = 100;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Describes the files written for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedPage {
    pub url: String,
    pub file_stem: String,
    pub html_path: PathBuf,
    pub txt_path: PathBuf,
    pub main_matches: usize,
}

/// Derives the archive file stem for a page URL
///
/// The legacy policy produces `host__page`: the host without a leading
/// `www.`, then the last path segment with any query and a trailing `.html`
/// removed. Distinct URLs can collide; the later write wins.
///
/// ```
/// use ls_crawler::config::FilenamePolicy;
/// use ls_crawler::crawler::derive_file_stem;
///
/// let stem = derive_file_stem(
///     "https://www.example.de/leichte-sprache/start.html?x=1",
///     FilenamePolicy::Legacy,
/// ).unwrap();
/// assert_eq!(stem, "example.de__start");
/// ```
pub fn derive_file_stem(url: &str, policy: FilenamePolicy) -> Result<String, ArchiveError> {
    let host = url
        .split('/')
        .nth(2)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ArchiveError::Filename(url.to_string()))?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    let mut page = url.rsplit('/').next().unwrap_or("");
    if let Some((before, _)) = page.split_once('?') {
        page = before;
    }
    let page = page.strip_suffix(".html").unwrap_or(page);

    match policy {
        FilenamePolicy::Legacy => Ok(format!("{}__{}", host, page)),
        FilenamePolicy::Hashed => {
            let digest = hex::encode(Sha256::digest(url.as_bytes()));
            Ok(format!(
                "{}__{}_{}",
                sanitize(host),
                sanitize(truncate(page, MAX_PAGE_TOKEN)),
                &digest[..8]
            ))
        }
    }
}

/// Cuts `s` to at most `max` bytes on a char boundary
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\\' | ':' | '*' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Writes page pairs into the save directory
pub struct PageArchiver<C: TextConverter> {
    dir: PathBuf,
    policy: FilenamePolicy,
    converter: C,
}

impl<C: TextConverter> PageArchiver<C> {
    pub fn new(dir: impl Into<PathBuf>, policy: FilenamePolicy, converter: C) -> Self {
        Self {
            dir: dir.into(),
            policy,
            converter,
        }
    }

    /// The save directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the save directory if it does not exist
    pub fn ensure_dir(&self) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ArchiveError::Write {
            path: self.dir.clone(),
            source,
        })
    }

    /// Archives one page
    ///
    /// # Arguments
    ///
    /// * `url` - The page's final URL; names the files and heads the text file
    /// * `raw_markup` - Body bytes exactly as received
    /// * `main_content` - Markup to convert into the text file
    /// * `main_matches` - How many main-content elements were found
    ///
    /// An existing pair with the same stem is overwritten.
    pub fn archive(
        &self,
        url: &Url,
        raw_markup: &[u8],
        main_content: &str,
        main_matches: usize,
    ) -> Result<ArchivedPage, ArchiveError> {
        tracing::debug!("Saving page {}", url);

        let file_stem = derive_file_stem(url.as_str(), self.policy)?;
        let html_path = self.dir.join(format!("{}.html", file_stem));
        let txt_path = self.dir.join(format!("{}.txt", file_stem));

        write_atomic(&html_path, raw_markup)?;

        let text = format!("{}\n\n{}", url, self.converter.convert(main_content));
        write_atomic(&txt_path, text.as_bytes())?;

        Ok(ArchivedPage {
            url: url.to_string(),
            file_stem,
            html_path,
            txt_path,
            main_matches,
        })
    }
}

/// Writes `bytes` to a temporary sibling and renames it over `path`
///
/// Readers never observe a half-written file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArchiveError> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(format!(
        ".{}.{}.part",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let temp = PathBuf::from(temp);

    let write_err = |source| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Err(e) = std::fs::write(&temp, bytes) {
        let _ = std::fs::remove_file(&temp);
        return Err(write_err(e));
    }
    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        write_err(e)
    })
}
