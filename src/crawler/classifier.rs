//! Link classification
//!
//! Decides which anchors point at a Leichte Sprache section of the same site.

use crate::crawler::parser::LinkCandidate;
use crate::url::{href_scheme, resolve_href, same_site};
use std::collections::HashSet;
use url::Url;

/// Extensions of linked files that are never fetched
const MEDIA_EXTENSIONS: [&str; 2] = [".mp3", ".pdf"];

/// Returns true when an anchor label names Leichte Sprache
///
/// Matches "leicht" together with "sprach" (covering "Leichte Sprache",
/// "Leichter Sprache", "leicht-sprachlich") or the `de-plain` language tag.
pub fn label_matches(label: &str) -> bool {
    let label = label.to_lowercase();
    (label.contains("leicht") && label.contains("sprach")) || label.contains("de-plain")
}

/// Decides whether an anchor is a Leichte Sprache candidate
///
/// An anchor qualifies when its href is non-empty, uses no scheme other than
/// http(s), resolves to the same registrable domain as `page_url`, and its
/// label matches [`label_matches`].
pub fn is_candidate(href: &str, label: &str, page_url: &Url) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }

    if let Some(scheme) = href_scheme(href) {
        if scheme != "http" && scheme != "https" {
            return false;
        }
    }

    let Some(target) = resolve_href(page_url, href) else {
        return false;
    };
    if !same_site(&target, page_url) {
        return false;
    }

    label_matches(label)
}

/// Returns true for hrefs to media files the crawler does not fetch
pub fn is_media_link(href: &str) -> bool {
    let href = href.trim().to_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| href.ends_with(ext))
}

/// Returns the distinct candidate hrefs of a page, in document order
pub fn classify_anchors(anchors: &[LinkCandidate], page_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for anchor in anchors {
        if !is_candidate(&anchor.href, &anchor.label, page_url) {
            continue;
        }
        let href = anchor.href.trim();
        if seen.insert(href.to_string()) {
            candidates.push(href.to_string());
        }
    }

    candidates
}
