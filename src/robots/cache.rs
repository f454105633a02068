//! Robots.txt caching
//!
//! Rules are cached per origin (scheme, host, port) and refreshed after 24
//! hours, which only matters for very long crawls.

use crate::robots::{fetch_robots, RobotsRules};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Cached robots.txt rules for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached rules are older than 24 hours
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }
}

/// Shared robots.txt cache used by the fetch layer
pub struct RobotsCache {
    client: Client,
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the rules governing `url`, fetching robots.txt on first use
    ///
    /// Two concurrent first requests to one origin may both fetch robots.txt;
    /// the later answer simply replaces the earlier one.
    pub async fn rules_for(&self, url: &Url) -> RobotsRules {
        let origin = url.origin().ascii_serialization();

        {
            let entries = self.entries.lock().await;
            if let Some(cached) = entries.get(&origin) {
                if !cached.is_stale() {
                    return cached.rules.clone();
                }
            }
        }

        tracing::debug!("Fetching robots.txt for {}", origin);
        let rules = fetch_robots(&self.client, url).await;

        self.entries
            .lock()
            .await
            .insert(origin, CachedRobots::new(rules.clone()));

        rules
    }

    /// Number of origins with cached rules
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
