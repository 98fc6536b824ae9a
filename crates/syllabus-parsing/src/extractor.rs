use std::path::Path;

use syllabus_core::{
    Bibliography, BibliographyEntry, BackendError, CourseMetadata, CourseRecord, TextBackend,
};

use crate::classify::BibliographyClassifier;
use crate::config::{ParsingConfig, ParsingConfigBuilder};
use crate::section::{self, SectionKind, SectionSpan};
use crate::{ParsingError, content, metadata, segment, text_processing};

/// A configurable course extraction pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`CourseExtractor::with_config`] to supply custom patterns and thresholds.
pub struct CourseExtractor {
    config: ParsingConfig,
    classifier: BibliographyClassifier,
}

impl Default for CourseExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CourseExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ParsingConfig) -> Self {
        let classifier = BibliographyClassifier::with_config(&config);
        Self { config, classifier }
    }

    /// Compile a builder and create an extractor from it.
    pub fn from_builder(builder: ParsingConfigBuilder) -> Result<Self, ParsingError> {
        Ok(Self::with_config(builder.build()?))
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn classifier(&self) -> &BibliographyClassifier {
        &self.classifier
    }

    /// Obtain the document text through `backend` (step 1).
    pub fn extract_text(&self, path: &Path, backend: &dyn TextBackend) -> Result<String, ParsingError> {
        let text = backend.extract_text(path)?;
        if text.trim().is_empty() {
            return Err(BackendError::EmptyText.into());
        }
        Ok(text)
    }

    /// Normalize raw document text (step 2).
    pub fn normalize(&self, raw: &str) -> String {
        text_processing::normalize(raw)
    }

    /// Locate the section spans in normalized text (step 3).
    pub fn locate_sections(&self, text: &str) -> Vec<SectionSpan> {
        section::locate_all_with_config(text, &self.config)
    }

    /// Apply the metadata field table (step 4).
    pub fn extract_metadata(&self, text: &str) -> CourseMetadata {
        metadata::extract_metadata(text)
    }

    /// Segment bibliography text into reference strings (step 5).
    pub fn segment_entries(&self, text: &str) -> Vec<String> {
        segment::segment_entries_with_config(text, &self.config)
    }

    /// Classify a single reference string (step 6).
    pub fn classify_entry(&self, raw: &str) -> BibliographyEntry {
        self.classifier.classify(raw)
    }

    /// Split, segment and classify a bibliography section body.
    pub fn parse_bibliography(&self, section_text: &str) -> Bibliography {
        let split = section::split_bibliography_with_config(section_text, &self.config);
        let parse_tier = |text: Option<&str>| -> Vec<BibliographyEntry> {
            text.map(|t| self.classifier.classify_all(&self.segment_entries(t)))
                .unwrap_or_default()
        };
        Bibliography {
            minimum: parse_tier(split.minimum),
            supplementary: parse_tier(split.supplementary),
        }
    }

    /// Run the pipeline on text handed over by a text collaborator.
    ///
    /// `None` means the text could not be obtained: the record is marked
    /// failed and no sub-extraction runs.
    pub fn extract_from_text(&self, filename: &str, raw: Option<&str>) -> CourseRecord {
        let mut record = CourseRecord::new(filename);

        let Some(raw) = raw else {
            record.add_error("could not obtain text from document");
            return record;
        };
        let text = self.normalize(raw);
        if text.is_empty() {
            record.add_error("document contains no extractable text");
            return record;
        }

        record.metadata = self.extract_metadata(&text);

        for span in self.locate_sections(&text) {
            let body = span.slice(&text);
            match span.kind {
                SectionKind::Description => record.description = content::extract_description(body),
                SectionKind::Outcomes => record.outcomes = content::extract_outcomes(body),
                SectionKind::Contents => record.contents = content::extract_outline(body),
                SectionKind::Methodology => {
                    record.methodology = content::extract_methodology_with_config(body, &self.config)
                }
                SectionKind::Evaluation => {
                    record.evaluation = content::extract_evaluation_with_config(body, &self.config)
                }
                SectionKind::Bibliography => record.bibliography = self.parse_bibliography(body),
                SectionKind::Institutional => {
                    record.institutional = metadata::extract_institutional(body)
                }
            }
        }

        if record.metadata.code.is_none() {
            tracing::warn!(file = filename, "no course code found");
        }
        tracing::debug!(
            file = filename,
            code = record.code().unwrap_or("-"),
            outcomes = record.outcomes.len(),
            outline_items = record.contents.len(),
            bibliography_entries = record.bibliography.total_entries(),
            "extracted course"
        );
        record
    }

    /// Run the full pipeline on a document file. Never fails: a document
    /// whose text cannot be read yields a failed record.
    pub fn extract_from_path(&self, path: &Path, backend: &dyn TextBackend) -> CourseRecord {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match self.extract_text(path, backend) {
            Ok(text) => self.extract_from_text(&filename, Some(&text)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "text extraction failed");
                let mut record = CourseRecord::new(filename);
                record.add_error(e.to_string());
                record
            }
        }
    }
}
