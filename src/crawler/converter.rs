//! Markup to plain text conversion

use html2text::render::text_renderer::TrivialDecorator;

/// Converts an HTML fragment into plain text
pub trait TextConverter: Send + Sync {
    fn convert(&self, markup: &str) -> String;
}

/// Plain-text rendering via html2text
///
/// Link targets, emphasis markers and image sources are dropped; images
/// contribute their alt text.
#[derive(Debug, Clone)]
pub struct Html2TextConverter {
    width: usize,
}

impl Html2TextConverter {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl Default for Html2TextConverter {
    fn default() -> Self {
        Self::new(78)
    }
}

impl TextConverter for Html2TextConverter {
    fn convert(&self, markup: &str) -> String {
        html2text::from_read_with_decorator(markup.as_bytes(), self.width, TrivialDecorator::new())
    }
}
