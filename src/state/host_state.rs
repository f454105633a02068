use std::time::{Duration, Instant};

/// Upper bound for a robots.txt crawl-delay
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Tracks request spacing for one host
///
/// The crawler never sends two requests to the same host closer together than
/// the configured download delay (or the robots.txt crawl-delay, if larger).
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests sent to this host in the current crawl
    pub request_count: u32,

    /// When the most recently reserved request may start
    pub next_slot: Option<Instant>,

    /// Crawl-delay announced by the host's robots.txt
    pub crawl_delay: Option<Duration>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied between requests to this host
    pub fn effective_delay(&self, download_delay: Duration) -> Duration {
        match self.crawl_delay {
            Some(delay) if delay > download_delay => delay,
            _ => download_delay,
        }
    }

    /// Reserves the next request slot and returns how long to wait for it
    ///
    /// Reservations are handed out in call order, so concurrent callers for
    /// the same host are spaced out one delay apart.
    pub fn reserve_slot(&mut self, download_delay: Duration, now: Instant) -> Duration {
        let delay = self.effective_delay(download_delay);

        let slot = match self.next_slot {
            Some(previous) if previous + delay > now => previous + delay,
            _ => now,
        };

        self.next_slot = Some(slot);
        self.request_count += 1;
        slot.saturating_duration_since(now)
    }

    /// Records the crawl-delay from robots.txt (seconds)
    ///
    /// Delays above [`MAX_CRAWL_DELAY`] are capped.
    pub fn set_crawl_delay(&mut self, seconds: Option<f64>) {
        self.crawl_delay = seconds
            .filter(|s| !s.is_nan() && *s > 0.0)
            .map(|s| {
                Duration::try_from_secs_f64(s)
                    .unwrap_or(MAX_CRAWL_DELAY)
                    .min(MAX_CRAWL_DELAY)
            });
    }
}
