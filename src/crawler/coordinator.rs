//! Crawler coordinator - the crawl runtime
//!
//! This module drives a crawl:
//! - Seeding the request queue from the site lists
//! - Running up to `max-concurrent-requests` fetches at once
//! - Feeding every completed fetch through the controller
//! - Archiving pages and emitting events to the sinks
//! - Stopping cleanly when cancelled

use crate::config::{Config, CrawlSeed};
use crate::crawler::archiver::PageArchiver;
use crate::crawler::controller::{ArchiveRequest, CrawlController, CrawlEvent, FollowUp};
use crate::crawler::converter::{Html2TextConverter, TextConverter};
use crate::crawler::fetcher::{FetchResult, Fetcher, HttpFetcher};
use crate::output::{
    generate_markdown_summary, generate_summary, EventSink, JsonLinesSink, OutputError,
    SharedStorage, SqliteEventSink,
};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::CrawlerError;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

type FetchOutcome = (FollowUp, FetchResult);

/// Totals of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Seeds handed to the crawl
    pub seeds: usize,

    /// Events emitted
    pub events: usize,

    /// Pages written to the save directory
    pub pages_archived: usize,

    /// Pages that could not be written
    pub archive_failures: usize,

    /// Requests that ended without a usable response
    pub failed_requests: usize,

    /// True when the crawl was cancelled before finishing
    pub interrupted: bool,
}

/// Main crawler runtime
pub struct Coordinator<F: Fetcher, C: TextConverter> {
    fetcher: Arc<F>,
    archiver: Arc<PageArchiver<C>>,
    controller: CrawlController,
    sinks: Vec<Box<dyn EventSink>>,
    max_in_flight: usize,
    cancel: CancellationToken,
}

impl<F: Fetcher + 'static, C: TextConverter + 'static> Coordinator<F, C> {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Issues the HTTP requests
    /// * `archiver` - Writes sub-pages to disk
    /// * `max_in_flight` - Upper bound on concurrent fetches (at least 1)
    /// * `cancel` - Cancelling this token stops the crawl gracefully
    pub fn new(
        fetcher: F,
        archiver: PageArchiver<C>,
        max_in_flight: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            archiver: Arc::new(archiver),
            controller: CrawlController::new(),
            sinks: Vec::new(),
            max_in_flight: max_in_flight.max(1),
            cancel,
        }
    }

    /// Adds a sink receiving every event and archive entry
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn controller(&self) -> &CrawlController {
        &self.controller
    }

    /// Crawls all `seeds` until no request is pending or the crawl is cancelled
    ///
    /// Fetch, HTTP and archive failures are logged and never abort the crawl.
    pub async fn run(&mut self, seeds: &[CrawlSeed]) -> Result<CrawlReport, CrawlerError> {
        self.archiver.ensure_dir()?;

        let mut report = CrawlReport {
            seeds: seeds.len(),
            ..CrawlReport::default()
        };

        let mut queue = VecDeque::new();
        for seed in seeds {
            if let Some(follow_up) = self.controller.seed(seed)? {
                queue.push_back(follow_up);
            }
        }

        tracing::info!("Starting crawl of {} homepages", queue.len());
        let start_time = std::time::Instant::now();

        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let cancel = self.cancel.clone();

        loop {
            if cancel.is_cancelled() && !self.controller.is_cancelled() {
                self.interrupt(&mut queue, in_flight.len())?;
                report.interrupted = true;
            }

            while in_flight.len() < self.max_in_flight {
                let Some(follow_up) = queue.pop_front() else {
                    break;
                };
                self.spawn_fetch(&mut in_flight, follow_up);
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled(), if !self.controller.is_cancelled() => {}
                joined = in_flight.join_next() => match joined {
                    Some(Ok((follow_up, result))) => {
                        self.process(follow_up, result, &mut queue, &mut report).await?;
                    }
                    Some(Err(e)) => {
                        tracing::error!("Fetch task failed: {}", e);
                        report.failed_requests += 1;
                    }
                    None => {}
                },
            }
        }

        let status = if report.interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        for sink in &self.sinks {
            if let Err(e) = sink.finalize(status) {
                tracing::error!("Failed to finalize output: {}", e);
            }
        }

        tracing::info!(
            "Crawl {}: {} events, {} pages archived, {} failed requests in {:?}",
            status.to_db_string(),
            report.events,
            report.pages_archived,
            report.failed_requests,
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Fetches `follow_up` on its own task
    ///
    /// A panicking fetcher still yields its follow-up, as a failed request.
    fn spawn_fetch(&self, in_flight: &mut JoinSet<FetchOutcome>, follow_up: FollowUp) {
        tracing::debug!("Fetching <{}>", follow_up.url);
        let fetcher = Arc::clone(&self.fetcher);
        let url = follow_up.url.clone();
        in_flight.spawn(async move {
            let fetch = tokio::spawn(async move { fetcher.fetch(&url).await });
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) => FetchResult::NetworkError {
                    error: format!("Fetch task failed: {}", e),
                },
            };
            (follow_up, result)
        });
    }

    /// Stops scheduling; queued requests are abandoned, in-flight ones finish
    fn interrupt(
        &mut self,
        queue: &mut VecDeque<FollowUp>,
        in_flight: usize,
    ) -> Result<(), CrawlerError> {
        tracing::info!(
            "Crawl cancelled, abandoning {} queued requests and waiting for {} in flight",
            queue.len(),
            in_flight
        );
        self.controller.cancel();
        for follow_up in queue.drain(..) {
            self.controller.handle_failure(&follow_up.context)?;
        }
        Ok(())
    }

    async fn process(
        &mut self,
        follow_up: FollowUp,
        result: FetchResult,
        queue: &mut VecDeque<FollowUp>,
        report: &mut CrawlReport,
    ) -> Result<(), CrawlerError> {
        let context = &follow_up.context;

        let page = match result {
            FetchResult::Page(page) => page,
            FetchResult::HttpError { status } => {
                tracing::info!("Ignoring <{}>: HTTP {}", follow_up.url, status);
                report.failed_requests += 1;
                return self.controller.handle_failure(context);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to fetch <{}>: {}", follow_up.url, error);
                report.failed_requests += 1;
                return self.controller.handle_failure(context);
            }
            FetchResult::RobotsDenied => {
                report.failed_requests += 1;
                return self.controller.handle_failure(context);
            }
        };

        let mut transition = self.controller.handle_response(&follow_up, &page)?;

        if let Some(request) = transition.archive.take() {
            self.archive(request, &context.homepage_id, report).await;
        }

        if let Some(event) = &transition.event {
            self.emit(event);
            report.events += 1;
        }

        queue.extend(transition.follow_ups);
        Ok(())
    }

    /// Writes the page pair on the blocking pool
    async fn archive(&self, request: ArchiveRequest, homepage_id: &str, report: &mut CrawlReport) {
        let archiver = Arc::clone(&self.archiver);
        let url = request.url.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            archiver.archive(
                &request.url,
                &request.raw_markup,
                &request.main_content,
                request.main_matches,
            )
        })
        .await;

        match outcome {
            Ok(Ok(archived)) => {
                report.pages_archived += 1;
                for sink in &self.sinks {
                    if let Err(e) = sink.record_archived(homepage_id, &archived) {
                        tracing::error!("Failed to record archived page {}: {}", archived.url, e);
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to archive <{}>: {}", url, e);
                report.archive_failures += 1;
            }
            Err(e) => {
                tracing::error!("Archive task for <{}> failed: {}", url, e);
                report.archive_failures += 1;
            }
        }
    }

    fn emit(&self, event: &CrawlEvent) {
        tracing::info!(
            start = event.start,
            start_url = %event.start_url,
            url = %event.url,
            ls_sublinks = event.ls_sublinks,
            "crawl event"
        );

        for sink in &self.sinks {
            if let Err(e) = sink.record_event(event) {
                tracing::error!("Failed to record event for {}: {}", event.url, e);
            }
        }
    }
}

/// Runs a complete crawl with the production fetcher and sinks
///
/// This function:
/// 1. Opens the database and starts a new run
/// 2. Builds the HTTP fetcher and the archiver
/// 3. Crawls every seed
/// 4. Marks the run completed, interrupted or failed
/// 5. Writes the markdown summary
///
/// # Example
///
/// ```no_run
/// use ls_crawler::config::{load_config_with_hash, load_site_lists};
/// use ls_crawler::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// let seeds = load_site_lists(&config)?;
/// run_crawl(&config, &hash, &seeds, CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    config_hash: &str,
    seeds: &[CrawlSeed],
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlerError> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(config_hash)?;
    tracing::info!("Starting crawl run {}", run_id);
    let shared: SharedStorage = Arc::new(Mutex::new(storage));

    let fetcher = HttpFetcher::new(config)?;
    let archiver = PageArchiver::new(
        &config.output.save_dir,
        config.output.filename_policy,
        Html2TextConverter::new(config.output.text_width),
    );

    let mut coordinator = Coordinator::new(
        fetcher,
        archiver,
        config.crawler.max_concurrent_requests as usize,
        cancel,
    );
    coordinator.add_sink(Box::new(JsonLinesSink::create(Path::new(
        &config.output.events_path,
    ))?));
    coordinator.add_sink(Box::new(SqliteEventSink::new(Arc::clone(&shared), run_id)));

    let report = match coordinator.run(seeds).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl run {} failed: {}", run_id, e);
            if let Ok(mut storage) = shared.lock() {
                if let Err(status_err) = storage.update_run_status(run_id, RunStatus::Failed) {
                    tracing::error!("Failed to mark run {} failed: {}", run_id, status_err);
                }
            }
            return Err(e);
        }
    };

    let summary = {
        let storage = shared
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))?;
        generate_summary(&*storage)?
    };
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;
    tracing::info!("Summary written to {}", config.output.summary_path);

    Ok(report)
}
