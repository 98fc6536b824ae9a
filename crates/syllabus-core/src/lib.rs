use std::path::Path;

use thiserror::Error;

pub mod config_file;
pub mod model;
pub mod outline;
pub mod stats;

// Re-export for convenience
pub use model::{
    Bibliography, BibliographyEntry, BibliographyTier, CitationStyle, CourseMetadata,
    CourseRecord, CourseSummary, EntryType, EvaluationItem, EvaluationScheme, InstitutionalInfo,
};
pub use outline::{ContentOutline, OutlineNode};
pub use stats::{BatchStats, ErrorCount, ExtractionReport, extraction_report};

/// Render the marker a backend places between consecutive pages.
///
/// The normalizer strips these lines again, so they never reach a
/// section or bibliography entry.
pub fn page_marker(page_number: usize) -> String {
    format!("--- PAGE {} ---", page_number)
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("document contains no extractable text")]
    EmptyText,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document text extraction backends.
///
/// Implementors provide the low-level text extraction step; everything
/// after it (normalization, section location, field and bibliography
/// parsing) lives in the parsing crate.
pub trait TextBackend: Send + Sync {
    /// Extract the full text content of a document, pages joined with
    /// [`page_marker`] lines.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}
