//! Site-list loading
//!
//! A site list is a plain text file with one homepage per line. Lines starting
//! with `#` are comments, blank lines are ignored, and lines without a scheme
//! are crawled over `http://`.

use crate::config::Config;
use crate::url::{homepage_id, is_german_domain, normalize_seed};
use crate::ConfigError;
use std::path::Path;
use url::Url;

/// A homepage to start crawling from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSeed {
    /// Absolute URL of the homepage
    pub url: Url,

    /// The seed with its scheme stripped; groups every event of this seed
    pub homepage_id: String,
}

impl CrawlSeed {
    /// Builds a seed from one site-list line
    pub fn parse(line: &str) -> crate::UrlResult<Self> {
        let url = normalize_seed(line)?;
        Ok(Self {
            url,
            homepage_id: homepage_id(line),
        })
    }
}

/// Loads every site list named in the configuration, in order
pub fn load_site_lists(config: &Config) -> Result<Vec<CrawlSeed>, ConfigError> {
    let mut seeds = Vec::new();

    for path in &config.seeds.site_lists {
        let loaded = load_site_list(path)?;
        tracing::debug!("Loaded {} seeds from {}", loaded.len(), path.display());
        seeds.extend(loaded);
    }

    for seed in &seeds {
        if !is_german_domain(&seed.url) {
            tracing::info!("Non .de domain <{}>", seed.url);
        }
    }

    tracing::info!("Loaded {} urls to crawl", seeds.len());
    Ok(seeds)
}

/// Loads one site-list file
pub fn load_site_list(path: &Path) -> Result<Vec<CrawlSeed>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::SiteList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_site_list(&content, path))
}

/// Parses site-list content; unusable lines are logged and skipped
pub fn parse_site_list(content: &str, source: &Path) -> Vec<CrawlSeed> {
    let mut seeds = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match CrawlSeed::parse(line) {
            Ok(seed) => seeds.push(seed),
            Err(e) => tracing::warn!(
                "Skipping {}:{} <{}>: {}",
                source.display(),
                index + 1,
                line,
                e
            ),
        }
    }

    seeds
}
