//! Output module for exporting records and reporting on a run
//!
//! This module handles:
//! - Exporting course records as JSON and CSV
//! - Fanning a record set out to several sinks
//! - Generating markdown summaries of crawl results
//! - Printing run statistics

mod csv_export;
mod json_export;
mod markdown;
pub mod stats;
mod traits;

pub use csv_export::{CsvExporter, CSV_FILE_NAME};
pub use json_export::{JsonExporter, JSON_FILE_NAME};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::print_summary;
pub use traits::{
    CandidateSummary, CrawlSummary, ExportError, ExportResult, ExportSink, FailedUrl,
};

use crate::record::CourseRecord;
use std::path::Path;

/// File name of the markdown run summary
pub const SUMMARY_FILE_NAME: &str = "summary.md";

/// Fans a record set out to every contained sink
///
/// Every sink is attempted; the first error is returned after all have run.
#[derive(Default)]
pub struct SinkSet {
    sinks: Vec<Box<dyn ExportSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON and CSV exporters writing into `directory`
    pub fn standard(directory: &Path) -> Self {
        Self::new()
            .with(JsonExporter::new(directory))
            .with(CsvExporter::new(directory))
    }

    pub fn with<S: ExportSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ExportSink for SinkSet {
    fn export(&self, records: &[CourseRecord]) -> ExportResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.export(records) {
                tracing::error!("Export to {} failed: {}", sink.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "sink-set"
    }
}
