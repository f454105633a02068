//! Crawl controller
//!
//! The controller decides what happens with every completed fetch: which
//! event is emitted, which follow-up requests are scheduled, and whether the
//! page is archived. It performs no I/O, so the whole traversal policy can be
//! exercised without a network.
//!
//! # Traversal
//!
//! A seed's homepage is fetched first. Every candidate link found on it is
//! fetched as a sub-page, and candidates found on sub-pages are followed as
//! well, as long as they stay on the seed's registrable domain. Each distinct
//! URL is fetched at most once per run.

use crate::config::CrawlSeed;
use crate::crawler::classifier::{classify_anchors, is_media_link};
use crate::crawler::fetcher::FetchedPage;
use crate::crawler::parser::parse_page;
use crate::state::{SeedProgress, SeedState};
use crate::url::{dedup_key, resolve_href};
use crate::CrawlerError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Metadata carried by every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Identifier of the seed this request descends from
    pub homepage_id: String,

    /// True only for the seed's own homepage request
    pub is_homepage: bool,
}

impl PageContext {
    pub fn homepage(homepage_id: impl Into<String>) -> Self {
        Self {
            homepage_id: homepage_id.into(),
            is_homepage: true,
        }
    }

    /// Context for a request discovered on this page
    pub fn subpage(&self) -> Self {
        Self {
            homepage_id: self.homepage_id.clone(),
            is_homepage: false,
        }
    }
}

/// The record emitted for every processed textual page
///
/// Field names are part of the output format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlEvent {
    /// True iff the page is the seed's homepage
    pub start: bool,

    /// Homepage identifier of the originating seed
    pub start_url: String,

    /// Final URL of the processed page
    pub url: String,

    /// Number of distinct candidate links found on the page
    pub ls_sublinks: usize,
}

/// A request the runtime should issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub url: Url,
    pub context: PageContext,
}

/// A page the runtime should hand to the archiver
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub url: Url,
    pub raw_markup: Vec<u8>,
    pub main_content: String,
    pub main_matches: usize,
}

/// Everything that follows from one completed fetch
#[derive(Debug, Default)]
pub struct Transition {
    pub event: Option<CrawlEvent>,
    pub follow_ups: Vec<FollowUp>,
    pub archive: Option<ArchiveRequest>,
}

/// Owns the run-wide dedup set and per-seed progress
#[derive(Debug, Default)]
pub struct CrawlController {
    seen: HashSet<String>,
    seeds: HashMap<String, SeedProgress>,
    cancelled: bool,
}

impl CrawlController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a seed and returns its homepage request
    ///
    /// Returns None when the seed's URL was already scheduled (a duplicate
    /// line in the site lists) or the crawl was cancelled.
    pub fn seed(&mut self, seed: &CrawlSeed) -> Result<Option<FollowUp>, CrawlerError> {
        if self.cancelled {
            return Ok(None);
        }

        if !self.seen.insert(dedup_key(&seed.url)) {
            tracing::debug!("Skipping duplicate seed {}", seed.url);
            return Ok(None);
        }

        self.progress_mut(&seed.homepage_id).request_scheduled()?;

        Ok(Some(FollowUp {
            url: seed.url.clone(),
            context: PageContext::homepage(seed.homepage_id.clone()),
        }))
    }

    /// Processes a successfully fetched page
    ///
    /// `request` is the follow-up that was fetched; `page.url` differs from
    /// its URL after redirects. A redirect landing on an already scheduled
    /// URL produces an empty transition, as do non-textual pages. Sub-pages
    /// are always archived; homepages never are.
    pub fn handle_response(
        &mut self,
        request: &FollowUp,
        page: &FetchedPage,
    ) -> Result<Transition, CrawlerError> {
        let context = &request.context;
        let mut transition = Transition::default();

        let final_key = dedup_key(&page.url);
        if final_key != dedup_key(&request.url) && !self.seen.insert(final_key) {
            tracing::debug!(
                "<{}> redirected to already scheduled <{}>",
                request.url,
                page.url
            );
            self.finish(context)?;
            return Ok(transition);
        }

        let Some(text) = page.text() else {
            tracing::debug!(
                "Ignoring <{}>, content type {}",
                page.url,
                page.content_type.as_deref().unwrap_or("unknown")
            );
            self.finish(context)?;
            return Ok(transition);
        };

        let parsed = parse_page(&text);
        let candidates = classify_anchors(&parsed.anchors, &page.url);

        if !context.is_homepage {
            let matches = parsed.main_content.matches();
            match matches {
                0 => tracing::info!("No main content found on <{}>, using whole page", page.url),
                1 => {}
                n => tracing::info!("{} main content elements on <{}>", n, page.url),
            }

            transition.archive = Some(ArchiveRequest {
                url: page.url.clone(),
                raw_markup: page.body.clone(),
                main_content: parsed.main_content.markup_or(&text),
                main_matches: matches,
            });
        }

        transition.event = Some(CrawlEvent {
            start: context.is_homepage,
            start_url: context.homepage_id.clone(),
            url: page.url.to_string(),
            ls_sublinks: candidates.len(),
        });

        if !self.cancelled {
            transition.follow_ups = self.schedule_candidates(&page.url, &candidates, context)?;
        }

        let progress = self.progress_mut(&context.homepage_id);
        progress.pages_fetched += 1;
        if transition.archive.is_some() {
            progress.pages_archived += 1;
        }

        self.finish(context)?;
        Ok(transition)
    }

    /// Records a request that ended without a usable response
    ///
    /// Covers HTTP errors, network failures, robots.txt refusals and
    /// requests abandoned on cancellation. No event is emitted.
    pub fn handle_failure(&mut self, context: &PageContext) -> Result<(), CrawlerError> {
        self.finish(context)
    }

    /// Stops scheduling new requests; in-flight ones may still complete
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Progress of one seed
    pub fn progress(&self, homepage_id: &str) -> Option<&SeedProgress> {
        self.seeds.get(homepage_id)
    }

    /// Progress of every seed registered so far
    pub fn seeds(&self) -> impl Iterator<Item = &SeedProgress> {
        self.seeds.values()
    }

    /// True once every registered seed has no pending requests
    pub fn is_idle(&self) -> bool {
        self.seeds.values().all(|p| p.pending == 0)
    }

    /// Whether `url` was already scheduled in this run
    pub fn has_seen(&self, url: &Url) -> bool {
        self.seen.contains(&dedup_key(url))
    }

    fn schedule_candidates(
        &mut self,
        page_url: &Url,
        candidates: &[String],
        context: &PageContext,
    ) -> Result<Vec<FollowUp>, CrawlerError> {
        let child = context.subpage();
        let mut follow_ups = Vec::new();

        for href in candidates {
            if is_media_link(href) {
                tracing::debug!("Not following media link {} on <{}>", href, page_url);
                continue;
            }

            let Some(url) = resolve_href(page_url, href) else {
                continue;
            };

            if !self.seen.insert(dedup_key(&url)) {
                tracing::trace!("Already scheduled <{}>", url);
                continue;
            }

            self.progress_mut(&context.homepage_id).request_scheduled()?;
            follow_ups.push(FollowUp {
                url,
                context: child.clone(),
            });
        }

        Ok(follow_ups)
    }

    fn finish(&mut self, context: &PageContext) -> Result<(), CrawlerError> {
        let progress = self.progress_mut(&context.homepage_id);
        let was_done = progress.state == SeedState::Done;
        progress.request_finished()?;

        if !was_done && progress.state == SeedState::Done {
            tracing::info!(
                "Finished {}: {} pages fetched, {} archived",
                progress.homepage_id,
                progress.pages_fetched,
                progress.pages_archived
            );
        }
        Ok(())
    }

    fn progress_mut(&mut self, homepage_id: &str) -> &mut SeedProgress {
        self.seeds
            .entry(homepage_id.to_string())
            .or_insert_with(|| SeedProgress::new(homepage_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOMEPAGE: &str = r#"<html><body>
        <a href="/ls/">Leichte Sprache</a>
        <a href="/impressum">Impressum</a>
    </body></html>"#;

    fn seed(line: &str) -> CrawlSeed {
        CrawlSeed::parse(line).unwrap()
    }

    fn html_page(url: &str, body: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse(url).unwrap(),
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    fn subpage_request(url: &str) -> FollowUp {
        FollowUp {
            url: Url::parse(url).unwrap(),
            context: PageContext::homepage("musterstadt.de").subpage(),
        }
    }

    #[test]
    fn test_seed_schedules_homepage() {
        let mut controller = CrawlController::new();
        let follow_up = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();

        assert_eq!(follow_up.url.as_str(), "http://musterstadt.de/");
        assert_eq!(follow_up.context, PageContext::homepage("musterstadt.de"));
        assert_eq!(
            controller.progress("musterstadt.de").unwrap().state,
            SeedState::FetchingHomepage
        );
    }

    #[test]
    fn test_duplicate_seed_ignored() {
        let mut controller = CrawlController::new();
        assert!(controller.seed(&seed("musterstadt.de")).unwrap().is_some());
        assert!(controller.seed(&seed("http://musterstadt.de/")).unwrap().is_none());
    }

    #[test]
    fn test_homepage_event_and_follow_up() {
        let mut controller = CrawlController::new();
        let follow_up = controller.seed(&seed("http://musterstadt.de")).unwrap().unwrap();

        let page = html_page("http://musterstadt.de/", HOMEPAGE);
        let transition = controller.handle_response(&follow_up, &page).unwrap();

        assert_eq!(
            transition.event,
            Some(CrawlEvent {
                start: true,
                start_url: "musterstadt.de".to_string(),
                url: "http://musterstadt.de/".to_string(),
                ls_sublinks: 1,
            })
        );
        assert!(transition.archive.is_none());
        assert_eq!(transition.follow_ups.len(), 1);
        assert_eq!(transition.follow_ups[0].url.as_str(), "http://musterstadt.de/ls/");
        assert!(!transition.follow_ups[0].context.is_homepage);
        assert_eq!(
            controller.progress("musterstadt.de").unwrap().state,
            SeedState::FetchingSubpages
        );
    }

    #[test]
    fn test_subpage_archived_and_seed_done() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("http://musterstadt.de")).unwrap().unwrap();
        let transition = controller
            .handle_response(&home, &html_page("http://musterstadt.de/", HOMEPAGE))
            .unwrap();
        let sub = &transition.follow_ups[0];

        let sub_page = html_page(
            "http://musterstadt.de/ls/",
            "<html><body><main><p>Willkommen</p></main></body></html>",
        );
        let transition = controller.handle_response(sub, &sub_page).unwrap();

        let event = transition.event.unwrap();
        assert!(!event.start);
        assert_eq!(event.start_url, "musterstadt.de");
        assert_eq!(event.ls_sublinks, 0);

        let archive = transition.archive.unwrap();
        assert_eq!(archive.main_matches, 1);
        assert!(archive.main_content.starts_with("<main>"));
        assert_eq!(archive.raw_markup, sub_page.body);

        let progress = controller.progress("musterstadt.de").unwrap();
        assert_eq!(progress.state, SeedState::Done);
        assert_eq!(progress.pages_fetched, 2);
        assert_eq!(progress.pages_archived, 1);
        assert!(controller.is_idle());
    }

    #[test]
    fn test_main_content_fallback_uses_whole_page() {
        let mut controller = CrawlController::new();
        let request = subpage_request("http://musterstadt.de/ls/");
        let body = "<html><body><p>Ohne Hauptbereich</p></body></html>";

        let transition = controller
            .handle_response(&request, &html_page("http://musterstadt.de/ls/", body))
            .unwrap();

        let archive = transition.archive.unwrap();
        assert_eq!(archive.main_matches, 0);
        assert_eq!(archive.main_content, body);
    }

    #[test]
    fn test_latin1_subpage_archived_as_decoded_text() {
        let mut controller = CrawlController::new();
        let request = subpage_request("http://musterstadt.de/ls/");
        let page = FetchedPage {
            url: Url::parse("http://musterstadt.de/ls/").unwrap(),
            status: 200,
            content_type: Some("text/html; charset=ISO-8859-1".to_string()),
            body: b"<main>Stra\xdfe f\xfcr alle</main>".to_vec(),
        };

        let archive = controller
            .handle_response(&request, &page)
            .unwrap()
            .archive
            .unwrap();

        assert_eq!(archive.main_content, "<main>Straße für alle</main>");
        assert_eq!(archive.raw_markup, page.body);
    }

    #[test]
    fn test_non_textual_page_yields_nothing() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();

        let page = FetchedPage {
            url: Url::parse("http://musterstadt.de/").unwrap(),
            status: 200,
            content_type: Some("image/png".to_string()),
            body: vec![0x89, b'P', b'N', b'G'],
        };
        let transition = controller.handle_response(&home, &page).unwrap();

        assert!(transition.event.is_none());
        assert!(transition.follow_ups.is_empty());
        assert!(transition.archive.is_none());
        assert_eq!(
            controller.progress("musterstadt.de").unwrap().state,
            SeedState::Done
        );
    }

    #[test]
    fn test_media_candidates_counted_but_not_followed() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();
        let body = r#"<a href="/ls/heft.pdf">Leichte Sprache (PDF)</a>
                      <a href="/ls/hoeren.mp3">Leichte Sprache hören</a>"#;

        let transition = controller
            .handle_response(&home, &html_page("http://musterstadt.de/", body))
            .unwrap();

        assert_eq!(transition.event.unwrap().ls_sublinks, 2);
        assert!(transition.follow_ups.is_empty());
    }

    #[test]
    fn test_cross_domain_candidates_ignored() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();
        let body = r#"<a href="http://nachbarstadt.de/ls">Leichte Sprache</a>"#;

        let transition = controller
            .handle_response(&home, &html_page("http://musterstadt.de/", body))
            .unwrap();

        assert_eq!(transition.event.unwrap().ls_sublinks, 0);
        assert!(transition.follow_ups.is_empty());
    }

    #[test]
    fn test_url_fetched_once_per_run() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();
        let transition = controller
            .handle_response(&home, &html_page("http://musterstadt.de/", HOMEPAGE))
            .unwrap();
        let sub = transition.follow_ups[0].clone();

        // the sub-page links back to itself and to the homepage
        let body = r#"<a href="/ls/#oben">Leichte Sprache</a>
                      <a href="/">Startseite in Leichter Sprache</a>"#;
        let transition = controller
            .handle_response(&sub, &html_page("http://musterstadt.de/ls/", body))
            .unwrap();

        assert_eq!(transition.event.unwrap().ls_sublinks, 2);
        assert!(transition.follow_ups.is_empty());
        assert!(controller.has_seen(&Url::parse("http://musterstadt.de/ls/").unwrap()));
    }

    #[test]
    fn test_redirect_to_processed_page_ignored() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();
        let body = r#"<a href="/ls/">Leichte Sprache</a>
                      <a href="/ls">Infos in Leichter Sprache</a>"#;
        let transition = controller
            .handle_response(&home, &html_page("http://musterstadt.de/", body))
            .unwrap();
        assert_eq!(transition.follow_ups.len(), 2);

        let sub_body = "<main><p>Willkommen</p></main>";
        let first = controller
            .handle_response(
                &transition.follow_ups[0],
                &html_page("http://musterstadt.de/ls/", sub_body),
            )
            .unwrap();
        assert!(first.event.is_some());

        // "/ls" answers with a redirect to "/ls/"
        let second = controller
            .handle_response(
                &transition.follow_ups[1],
                &html_page("http://musterstadt.de/ls/", sub_body),
            )
            .unwrap();

        assert!(second.event.is_none());
        assert!(second.archive.is_none());
        assert!(second.follow_ups.is_empty());

        let progress = controller.progress("musterstadt.de").unwrap();
        assert_eq!(progress.pages_fetched, 2);
        assert_eq!(progress.pages_archived, 1);
        assert_eq!(progress.state, SeedState::Done);
    }

    #[test]
    fn test_redirect_target_marked_seen() {
        let mut controller = CrawlController::new();
        let request = subpage_request("http://musterstadt.de/ls");

        let transition = controller
            .handle_response(
                &request,
                &html_page("http://musterstadt.de/leichte-sprache/", "<main>Hallo</main>"),
            )
            .unwrap();

        assert!(transition.event.is_some());
        assert!(controller.has_seen(&Url::parse("http://musterstadt.de/leichte-sprache/").unwrap()));
    }

    #[test]
    fn test_subpage_candidates_followed() {
        let mut controller = CrawlController::new();
        let request = subpage_request("http://musterstadt.de/ls/");
        let body = r#"<a href="/ls/wahlen.html">Wahlen in Leichter Sprache</a>"#;

        let transition = controller
            .handle_response(&request, &html_page("http://musterstadt.de/ls/", body))
            .unwrap();

        assert_eq!(transition.follow_ups.len(), 1);
        assert_eq!(
            transition.follow_ups[0].url.as_str(),
            "http://musterstadt.de/ls/wahlen.html"
        );
    }

    #[test]
    fn test_failure_completes_seed() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();

        controller.handle_failure(&home.context).unwrap();
        assert_eq!(
            controller.progress("musterstadt.de").unwrap().state,
            SeedState::Done
        );
    }

    #[test]
    fn test_cancel_stops_scheduling() {
        let mut controller = CrawlController::new();
        let home = controller.seed(&seed("musterstadt.de")).unwrap().unwrap();
        controller.cancel();

        let transition = controller
            .handle_response(&home, &html_page("http://musterstadt.de/", HOMEPAGE))
            .unwrap();

        assert!(transition.event.is_some());
        assert!(transition.follow_ups.is_empty());
        assert!(controller.seed(&seed("nachbarstadt.de")).unwrap().is_none());
    }

    #[test]
    fn test_event_serializes_with_fixed_field_names() {
        let event = CrawlEvent {
            start: true,
            start_url: "musterstadt.de".to_string(),
            url: "http://musterstadt.de/".to_string(),
            ls_sublinks: 1,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"start":true,"start_url":"musterstadt.de","url":"http://musterstadt.de/","ls_sublinks":1}"#
        );
    }
}
