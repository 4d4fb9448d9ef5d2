//! Run statistics printed to stdout at the end of a crawl

use crate::output::traits::CrawlSummary;

/// Failed URLs printed before the list is cut short
const MAX_FAILED_PRINTED: usize = 10;

/// Prints a run summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Statistics ===\n");

    println!("Discovery:");
    println!("  Listing URL: {}", summary.listing_url);
    println!(
        "  Listing pages visited: {} ({} reachable)",
        summary.pages_visited, summary.pages_reachable
    );
    println!("  Load-more rounds: {}", summary.load_more_rounds);
    println!("  API listing pages: {}", summary.api_pages);
    println!();

    println!("Course Pages:");
    println!("  URLs discovered: {}", summary.urls_discovered);
    println!("  Done: {}", summary.urls_done);
    println!("  Failed: {}", summary.urls_failed);
    println!("  Records exported: {}", summary.records_exported);
    println!();

    println!(
        "Requests: {} ({} retries, {:.1}%)",
        summary.requests,
        summary.retries,
        summary.retry_rate()
    );
    println!();

    if !summary.candidates.is_empty() {
        println!("API Endpoint Candidates ({}):", summary.candidates.len());
        for candidate in &summary.candidates {
            println!(
                "  - [{}] {} (confidence {})",
                candidate.kind, candidate.url_pattern, candidate.confidence
            );
        }
        println!();
    }

    if !summary.failed_urls.is_empty() {
        println!("Failed URLs ({}):", summary.failed_urls.len());
        for failed in summary.failed_urls.iter().take(MAX_FAILED_PRINTED) {
            println!("  - {}: {}", failed.url, failed.reason);
        }
        if summary.failed_urls.len() > MAX_FAILED_PRINTED {
            println!(
                "  ... and {} more",
                summary.failed_urls.len() - MAX_FAILED_PRINTED
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} course pages successfully processed)",
        summary.success_rate(),
        summary.urls_done,
        summary.total_terminal_urls()
    );
}
