//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files so the fetch layer
//! can skip disallowed URLs and honour Crawl-delay.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::RobotsRules;

use reqwest::Client;
use url::Url;

/// Fetches the robots.txt governing `url`
///
/// Any failure (network error, non-2xx status, unreadable body) yields
/// allow-all rules; a missing robots.txt never blocks a crawl.
pub async fn fetch_robots(client: &Client, url: &Url) -> RobotsRules {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(_) => return RobotsRules::allow_all(),
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("robots.txt unavailable at {}: {}", robots_url, e);
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned HTTP {}",
            robots_url,
            response.status().as_u16()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsRules::from_content(&body),
        Err(e) => {
            tracing::debug!("Failed to read robots.txt at {}: {}", robots_url, e);
            RobotsRules::allow_all()
        }
    }
}
