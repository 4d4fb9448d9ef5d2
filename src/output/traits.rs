//! Export sink trait and run summary types
//!
//! This module defines the trait interface for record exporters and the
//! data structure describing a finished crawl run.

use crate::record::CourseRecord;
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Destination for the records of a run
///
/// Sinks receive the complete record set once, after the worker pool has
/// drained the frontier. Implementations must be thread-safe.
pub trait ExportSink: Send + Sync {
    /// Writes every record
    ///
    /// # Arguments
    ///
    /// * `records` - Records of the URLs that reached Done
    fn export(&self, records: &[CourseRecord]) -> ExportResult<()>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

/// A frontier URL that ended in the Failed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// A detected API endpoint as reported in the summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSummary {
    pub kind: String,
    pub url_pattern: String,
    pub confidence: u32,
}

/// Summary statistics for a crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,
    pub browser: String,
    pub listing_url: String,

    // Discovery
    pub pages_visited: u32,
    pub pages_reachable: u32,
    pub load_more_rounds: u32,
    pub api_pages: u32,
    pub responses_inspected: usize,

    // Frontier
    pub urls_discovered: usize,
    pub urls_done: usize,
    pub urls_failed: usize,
    pub records_exported: usize,
    pub api_documents: usize,

    // Fetch executor
    pub requests: u64,
    pub retries: u64,

    pub candidates: Vec<CandidateSummary>,
    pub failed_urls: Vec<FailedUrl>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of frontier URLs in terminal states
    pub fn total_terminal_urls(&self) -> usize {
        self.urls_done + self.urls_failed
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let terminal = self.total_terminal_urls();
        if terminal == 0 {
            return 0.0;
        }
        (self.urls_done as f64 / terminal as f64) * 100.0
    }

    /// Returns the share of requests that were retries, as a percentage
    pub fn retry_rate(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        (self.retries as f64 / self.requests as f64) * 100.0
    }
}
