//! Markdown summary generation
//!
//! Produces a human-readable report of one run: totals, then one table row
//! per crawled homepage.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Leichte Sprache Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Totals
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!(
        "- **Homepages Crawled**: {}\n",
        summary.homepages_crawled
    ));
    md.push_str(&format!(
        "- **Homepages Linking to Leichte Sprache**: {} ({:.2}%)\n",
        summary.homepages_with_candidates,
        summary.candidate_rate()
    ));
    md.push_str(&format!(
        "- **Sub-pages Fetched**: {}\n",
        summary.subpages_fetched
    ));
    md.push_str(&format!(
        "- **Pages Archived**: {}\n\n",
        summary.pages_archived
    ));

    if !summary.homepages.is_empty() {
        md.push_str("## Homepages\n\n");
        md.push_str("| Homepage | Candidate Links | Sub-pages | Archived |\n");
        md.push_str("|----------|-----------------|-----------|----------|\n");

        for homepage in &summary.homepages {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(&homepage.homepage_id),
                homepage.ls_sublinks,
                homepage.subpages,
                homepage.archived
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
