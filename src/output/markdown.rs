//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a crawl run,
//! including discovery statistics, detected API endpoints, and failed URLs.

use crate::output::traits::{CrawlSummary, ExportResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Failed URLs listed in full before the list is truncated
const MAX_FAILED_LISTED: usize = 50;

/// Generates a markdown summary from crawl statistics
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(ExportError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> ExportResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Course-Ripple Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
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
    md.push_str(&format!("- **Browser**: {}\n", summary.browser));
    md.push_str(&format!("- **Listing URL**: {}\n", summary.listing_url));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Discovery
    md.push_str("## Listing Discovery\n\n");
    md.push_str(&format!("- **Pages Visited**: {}\n", summary.pages_visited));
    md.push_str(&format!(
        "- **Pages Reachable**: {}\n",
        summary.pages_reachable
    ));
    md.push_str(&format!(
        "- **Load-More Rounds**: {}\n",
        summary.load_more_rounds
    ));
    md.push_str(&format!("- **API Pages**: {}\n", summary.api_pages));
    md.push_str(&format!(
        "- **Responses Inspected**: {}\n\n",
        summary.responses_inspected
    ));

    // Frontier outcome
    md.push_str("## Course Pages\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!(
        "| Discovered | {} |\n",
        summary.urls_discovered
    ));
    md.push_str(&format!("| Done | {} |\n", summary.urls_done));
    md.push_str(&format!("| Failed | {} |\n", summary.urls_failed));
    md.push_str(&format!(
        "| Records Exported | {} |\n",
        summary.records_exported
    ));
    md.push_str(&format!(
        "| With API Document | {} |\n\n",
        summary.api_documents
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!("- **Requests**: {}\n", summary.requests));
    md.push_str(&format!(
        "- **Retries**: {} ({:.2}%)\n\n",
        summary.retries,
        summary.retry_rate()
    ));

    // API candidates
    if !summary.candidates.is_empty() {
        md.push_str("## API Endpoint Candidates\n\n");
        md.push_str("| Kind | Pattern | Confidence |\n");
        md.push_str("|------|---------|------------|\n");

        for candidate in &summary.candidates {
            md.push_str(&format!(
                "| {} | `{}` | {} |\n",
                candidate.kind, candidate.url_pattern, candidate.confidence
            ));
        }
        md.push('\n');
    }

    // Failed URLs
    if !summary.failed_urls.is_empty() {
        md.push_str("## Failed URLs\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");

        for failed in summary.failed_urls.iter().take(MAX_FAILED_LISTED) {
            md.push_str(&format!(
                "| {} | {} |\n",
                failed.url,
                failed.reason.replace('|', "\\|")
            ));
        }
        if summary.failed_urls.len() > MAX_FAILED_LISTED {
            md.push_str(&format!(
                "\n... and {} more\n\n",
                summary.failed_urls.len() - MAX_FAILED_LISTED
            ));
        } else {
            md.push('\n');
        }
    }

    md
}
