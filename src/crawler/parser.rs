//! HTML parsing for anchors and main content
//!
//! Pages are parsed once; the anchors feed the link classifier and the
//! main-content fragments feed the archiver.

use scraper::{ElementRef, Html, Selector};

/// Elements treated as a page's main content, matched as one union, in document order
const MAIN_CONTENT_SELECTOR: &str = r#"main, div[role="main"], section[role="main"], div[class="main-row"], div[class="main"], div[id="main"]"#;

/// One `<a>` element as seen by the link classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// The raw `href` attribute (empty when absent)
    pub href: String,

    /// Lowercased visible label of the anchor
    pub label: String,
}

/// Main-content fragments of a page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainContent {
    pub fragments: Vec<String>,
}

impl MainContent {
    /// Number of elements that matched the main-content selector
    pub fn matches(&self) -> usize {
        self.fragments.len()
    }

    /// The fragments joined by newlines, or `fallback` when nothing matched
    pub fn markup_or(&self, fallback: &str) -> String {
        if self.fragments.is_empty() {
            fallback.to_string()
        } else {
            self.fragments.join("\n")
        }
    }
}

/// Everything the crawler reads out of one page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub anchors: Vec<LinkCandidate>,
    pub main_content: MainContent,
}

/// Parses `html` and extracts anchors and main content
///
/// # Example
///
/// ```
/// use ls_crawler::crawler::parse_page;
///
/// let html = r#"<main><a href="/ls/">Leichte Sprache</a></main>"#;
/// let parsed = parse_page(html);
/// assert_eq!(parsed.anchors[0].href, "/ls/");
/// assert_eq!(parsed.anchors[0].label, "leichte sprache");
/// assert_eq!(parsed.main_content.matches(), 1);
/// ```
pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        anchors: extract_anchors(&document),
        main_content: extract_main_content(&document),
    }
}

/// Extracts every `<a>` element with its href and label
fn extract_anchors(document: &Html) -> Vec<LinkCandidate> {
    let Ok(anchor_selector) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&anchor_selector)
        .map(|element| LinkCandidate {
            href: element.value().attr("href").unwrap_or("").to_string(),
            label: anchor_label(&element),
        })
        .collect()
}

/// Builds the lowercased label of an anchor
///
/// The label is the anchor's text plus its `title` and `aria-label`
/// attributes and the `alt` text of images inside it, so icon links such as
/// `<a><img alt="Leichte Sprache"></a>` are recognised too.
fn anchor_label(element: &ElementRef) -> String {
    let mut parts: Vec<String> = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    for attr in ["title", "aria-label"] {
        if let Some(value) = element.value().attr(attr) {
            parts.push(value.trim().to_string());
        }
    }

    if let Ok(img_selector) = Selector::parse("img[alt]") {
        for img in element.select(&img_selector) {
            if let Some(alt) = img.value().attr("alt") {
                parts.push(alt.trim().to_string());
            }
        }
    }

    parts.join(" ").to_lowercase()
}

/// Collects the outer markup of every main-content element
///
/// Nested matches are kept as separate fragments, so their text may appear
/// twice in the converted output.
fn extract_main_content(document: &Html) -> MainContent {
    let Ok(selector) = Selector::parse(MAIN_CONTENT_SELECTOR) else {
        return MainContent::default();
    };

    MainContent {
        fragments: document.select(&selector).map(|e| e.html()).collect(),
    }
}
