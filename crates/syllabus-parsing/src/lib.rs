use std::path::Path;

use thiserror::Error;

pub mod authors;
pub mod backend;
pub mod classify;
pub mod config;
pub mod content;
pub mod extractor;
pub mod metadata;
pub mod scoring;
pub mod section;
pub mod segment;
pub mod text_processing;

pub use backend::PlainTextBackend;
pub use classify::{
    BibliographyClassifier, CitationStrategy, EntryParse, StrategyContext, StrategyError,
};
pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder, UnlabeledBibliography};
pub use extractor::CourseExtractor;
pub use scoring::ConfidenceWeights;
pub use section::{BibliographySplit, SectionKind, SectionSpan};
// Re-export domain types from core (canonical definitions live there)
pub use syllabus_core::{BackendError, CourseRecord, TextBackend};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Extract one course record from a document using the given backend for
/// text extraction.
///
/// Pipeline:
/// 1. Obtain the document text via `backend`
/// 2. Normalize whitespace, glyphs and page markers
/// 3. Locate the numbered sections and the institutional tail
/// 4. Read the labeled metadata fields
/// 5. Parse description, outcomes, outline, methodology and evaluation
/// 6. Segment and classify the minimum and supplementary bibliography
///
/// A document whose text cannot be obtained yields a record with
/// `extraction_success == false` rather than an error.
pub fn extract_course(path: &Path, backend: &dyn TextBackend) -> CourseRecord {
    CourseExtractor::new().extract_from_path(path, backend)
}
