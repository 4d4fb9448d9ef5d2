//! JSON export of course records

use crate::output::traits::{ExportResult, ExportSink};
use crate::record::CourseRecord;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name written inside the output directory
pub const JSON_FILE_NAME: &str = "courses.json";

/// Writes every record as one pretty-printed JSON array
#[derive(Debug, Clone)]
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    /// Creates an exporter writing `courses.json` inside `directory`
    pub fn new(directory: &Path) -> Self {
        Self {
            path: directory.join(JSON_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for JsonExporter {
    fn export(&self, records: &[CourseRecord]) -> ExportResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::info!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}
