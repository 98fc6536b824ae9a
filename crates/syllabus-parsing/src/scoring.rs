//! Confidence values for the citation-style strategies.
//!
//! The exact-pattern strategies report fixed confidences. The author-year
//! strategy builds its confidence from the fields it manages to recover,
//! weighted by [`ConfidenceWeights`].

/// Confidence of a full IEEE-like match.
pub const IEEE_CONFIDENCE: f64 = 0.95;
/// Confidence of a full APA-like match.
pub const APA_CONFIDENCE: f64 = 0.9;
/// Fallback confidence when at least one field was recovered.
pub const FALLBACK_FOUND_CONFIDENCE: f64 = 0.2;
/// Fallback confidence when nothing was recovered, and the floor for every entry.
pub const MIN_CONFIDENCE: f64 = syllabus_core::BibliographyEntry::MIN_CONFIDENCE;

/// Weights for the author-year strategy.
///
/// - `base`: granted to every candidate
/// - `year`: a plausible 19xx/20xx year was found
/// - `title`: a quoted title or a title-indicator phrase was found
/// - `publisher`: a publisher was found
/// - `authors`: at least one author survived cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceWeights {
    pub base: f64,
    pub year: f64,
    pub title: f64,
    pub publisher: f64,
    pub authors: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            base: 0.3,
            year: 0.2,
            title: 0.3,
            publisher: 0.1,
            authors: 0.1,
        }
    }
}

/// Which fields an author-year parse recovered.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldsFound {
    pub year: bool,
    pub title: bool,
    pub publisher: bool,
    pub authors: bool,
}

impl ConfidenceWeights {
    /// Weighted sum of the recovered fields, capped at 1.0.
    pub fn score(&self, found: FieldsFound) -> f64 {
        let mut confidence = self.base;
        if found.year {
            confidence += self.year;
        }
        if found.title {
            confidence += self.title;
        }
        if found.publisher {
            confidence += self.publisher;
        }
        if found.authors {
            confidence += self.authors;
        }
        confidence.min(1.0)
    }
}
