//! CSV export of course records
//!
//! One row per record. Instructors are joined with `"; "` and the raw
//! JSON-LD block is serialized inline as compact JSON.

use crate::output::traits::{ExportResult, ExportSink};
use crate::record::CourseRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name written inside the output directory
pub const CSV_FILE_NAME: &str = "courses.csv";

const INSTRUCTOR_SEPARATOR: &str = "; ";

/// Header row; must match the field order of `CsvRow`
const COLUMNS: &[&str] = &[
    "url",
    "title",
    "provider_platform",
    "university",
    "instructors",
    "description",
    "rating",
    "review_count",
    "language",
    "level",
    "duration",
    "price",
    "price_currency",
    "certificate_availability",
    "enrollment_link",
    "image_url",
    "raw_json_ld",
];

/// Flattened view of a record; field order is the column order
#[derive(Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    title: &'a str,
    provider_platform: Option<&'a str>,
    university: Option<&'a str>,
    instructors: String,
    description: Option<&'a str>,
    rating: Option<f64>,
    review_count: Option<u64>,
    language: Option<&'a str>,
    level: Option<&'a str>,
    duration: Option<&'a str>,
    price: Option<f64>,
    price_currency: Option<&'a str>,
    certificate_availability: Option<&'a str>,
    enrollment_link: &'a str,
    image_url: Option<&'a str>,
    raw_json_ld: Option<String>,
}

impl<'a> CsvRow<'a> {
    fn from_record(record: &'a CourseRecord) -> ExportResult<Self> {
        let raw_json_ld = record
            .raw_json_ld
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            url: &record.url,
            title: &record.title,
            provider_platform: record.provider_platform.as_deref(),
            university: record.university.as_deref(),
            instructors: record.instructors.join(INSTRUCTOR_SEPARATOR),
            description: record.description.as_deref(),
            rating: record.rating,
            review_count: record.review_count,
            language: record.language.as_deref(),
            level: record.level.as_deref(),
            duration: record.duration.as_deref(),
            price: record.price,
            price_currency: record.price_currency.as_deref(),
            certificate_availability: record.certificate_availability.as_deref(),
            enrollment_link: &record.enrollment_link,
            image_url: record.image_url.as_deref(),
            raw_json_ld,
        })
    }
}

/// Writes every record as a row of `courses.csv`
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    /// Creates an exporter writing `courses.csv` inside `directory`
    pub fn new(directory: &Path) -> Self {
        Self {
            path: directory.join(CSV_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for CsvExporter {
    fn export(&self, records: &[CourseRecord]) -> ExportResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        writer.write_record(COLUMNS)?;
        for record in records {
            writer.serialize(CsvRow::from_record(record)?)?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} rows to {}", records.len(), self.path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}
