//! Crawler module for finding and archiving Leichte Sprache pages
//!
//! This module contains the core crawling logic, including:
//! - Anchor and main-content extraction
//! - Link classification
//! - The crawl controller (what follows from each fetched page)
//! - HTTP fetching with robots.txt and per-host politeness
//! - Page archiving
//! - The concurrent crawl runtime

mod archiver;
mod classifier;
mod controller;
mod converter;
mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use archiver::{derive_file_stem, ArchivedPage, PageArchiver};
pub use classifier::{classify_anchors, is_candidate, is_media_link, label_matches};
pub use controller::{
    ArchiveRequest, CrawlController, CrawlEvent, FollowUp, PageContext, Transition,
};
pub use converter::{Html2TextConverter, TextConverter};
pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{
    build_http_client, fetch_page, is_textual_content_type, FetchResult, FetchedPage, Fetcher,
    HttpFetcher,
};
pub use parser::{parse_page, LinkCandidate, MainContent, ParsedPage};
pub use scheduler::Politeness;
