//! Per-host request spacing
//!
//! Requests to one host are spaced by the configured download delay, or by
//! the host's robots.txt crawl-delay when that is larger. Requests to
//! different hosts never wait for each other.

use crate::state::HostState;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Hands out request slots per host
pub struct Politeness {
    download_delay: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl Politeness {
    pub fn new(download_delay: Duration) -> Self {
        Self {
            download_delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Records the crawl-delay (seconds) a host announced in robots.txt
    pub async fn set_crawl_delay(&self, host: &str, seconds: Option<f64>) {
        let mut hosts = self.hosts.lock().await;
        hosts
            .entry(host.to_string())
            .or_insert_with(HostState::new)
            .set_crawl_delay(seconds);
    }

    /// Reserves the next slot for `host` and returns how long to wait for it
    pub async fn reserve(&self, host: &str) -> Duration {
        let mut hosts = self.hosts.lock().await;
        hosts
            .entry(host.to_string())
            .or_insert_with(HostState::new)
            .reserve_slot(self.download_delay, Instant::now())
    }

    /// Waits until a request to `host` may be sent
    pub async fn wait_turn(&self, host: &str) {
        let wait = self.reserve(host).await;
        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before next request to {}", wait, host);
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of requests reserved for `host` so far
    pub async fn request_count(&self, host: &str) -> u32 {
        self.hosts
            .lock()
            .await
            .get(host)
            .map(|state| state.request_count)
            .unwrap_or(0)
    }
}
