use std::path::Path;

use mupdf::{Document, TextPageFlags};

use syllabus_core::{BackendError, TextBackend, page_marker};

/// MuPDF-based implementation of [`TextBackend`].
///
/// This crate isolates the mupdf dependency (AGPL-3.0) so that the parsing
/// and reporting crates do not transitively depend on it.
///
/// Pages are separated by a `--- PAGE n ---` line, which the normalizer
/// strips again. Running headers and footers are off by default because
/// course programs put the course code in the page header; enable them
/// with [`with_header_exclusion`](Self::with_header_exclusion) and
/// [`with_footer_exclusion`](Self::with_footer_exclusion).
#[derive(Debug, Default, Clone)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude as footer (0.0–1.0).
    footer_exclusion_ratio: Option<f32>,
    /// Fraction of page height from top to exclude as header (0.0–1.0).
    header_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }
}

impl TextBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut text = String::new();
        let mut page_count = 0;

        for (index, page_result) in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .enumerate()
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let page_bounds = page
                .bounds()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let page_height = page_bounds.y1 - page_bounds.y0;

            let header_threshold = self
                .header_exclusion_ratio
                .map(|r| page_bounds.y0 + page_height * r);
            let footer_threshold = self
                .footer_exclusion_ratio
                .map(|r| page_bounds.y1 - page_height * r);

            text.push_str(&page_marker(index + 1));
            text.push('\n');

            for block in text_page.blocks() {
                let block_bounds = block.bounds();
                if header_threshold.is_some_and(|t| block_bounds.y1 <= t) {
                    continue;
                }
                if footer_threshold.is_some_and(|t| block_bounds.y0 >= t) {
                    continue;
                }

                for line in block.lines() {
                    text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                    text.push('\n');
                }
            }
            page_count += 1;
        }

        tracing::debug!(path = %path.display(), pages = page_count, chars = text.len(), "pdf text extracted");

        if text
            .lines()
            .all(|l| l.trim().is_empty() || l.starts_with("--- PAGE "))
        {
            return Err(BackendError::EmptyText);
        }
        Ok(text)
    }
}
