use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use syllabus_core::{CourseRecord, ExtractionReport};

pub mod csv;
pub mod export;

pub use csv::{bibliography_csv, csv_escape, metadata_csv, parse_csv, reclassify_csv};
pub use export::{bibliography_summary_json, batch_json, course_json, report_json};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed CSV at line {line}: {reason}")]
    MalformedCsv { line: usize, reason: String },
}

/// Which file families a batch export writes. The extraction report is
/// always written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    #[default]
    Both,
}

impl ExportFormat {
    pub fn includes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    pub fn includes_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown export format '{other}' (expected json, csv or both)"
            )),
        }
    }
}

/// Local timestamp used in batch output file names.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Write `content` to `path`, creating parent directories.
pub fn write_output(path: &Path, content: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), bytes = content.len(), "wrote export");
    Ok(())
}

/// Write the batch outputs into `dir`, each file name suffixed with `stamp`.
///
/// JSON: `courses_<stamp>.json` (all records keyed by code) and
/// `bibliography_<stamp>.json`. CSV: `metadata_<stamp>.csv` and
/// `bibliography_<stamp>.csv`. Always: `extraction_report_<stamp>.json`.
/// Returns the written paths in that order.
pub fn export_batch(
    records: &[CourseRecord],
    report: &ExtractionReport,
    dir: &Path,
    format: ExportFormat,
    stamp: &str,
) -> Result<Vec<PathBuf>, ExportError> {
    let mut written = Vec::new();
    let mut emit = |name: String, content: String| -> Result<(), ExportError> {
        let path = dir.join(name);
        write_output(&path, &content)?;
        written.push(path);
        Ok(())
    };

    if format.includes_json() {
        emit(format!("courses_{stamp}.json"), batch_json(records)?)?;
        emit(
            format!("bibliography_{stamp}.json"),
            bibliography_summary_json(records)?,
        )?;
    }
    if format.includes_csv() {
        emit(format!("metadata_{stamp}.csv"), metadata_csv(records))?;
        emit(format!("bibliography_{stamp}.csv"), bibliography_csv(records))?;
    }
    emit(
        format!("extraction_report_{stamp}.json"),
        report_json(records, report)?,
    )?;

    Ok(written)
}
