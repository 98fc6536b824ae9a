use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::outline::ContentOutline;

/// Basic course metadata pulled from the labeled header table.
///
/// Every field is independently optional: `None` (or an empty list) means
/// the label was not found, never that extraction failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discipline: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Which parsing strategy produced a bibliography entry's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStyle {
    Ieee,
    Apa,
    AuthorYear,
    Fallback,
    /// No strategy matched; only a best-effort author scan was run.
    Minimal,
}

impl CitationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ieee => "ieee",
            Self::Apa => "apa",
            Self::AuthorYear => "author_year",
            Self::Fallback => "fallback",
            Self::Minimal => "minimal",
        }
    }
}

/// Coarse kind of work a reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Book,
    Article,
    InProceedings,
    Web,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Article => "article",
            Self::InProceedings => "inproceedings",
            Self::Web => "web",
        }
    }
}

/// A single reference from a course bibliography.
///
/// `raw_text` is the source of truth and is always present; every other
/// field is a heuristic reading of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BibliographyEntry {
    pub raw_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_as: Option<CitationStyle>,
    /// Parse-strategy certainty in `[0, 1]`; not a statement about the
    /// reference being correct.
    pub confidence: f64,
}

impl BibliographyEntry {
    /// Lowest confidence an entry may carry.
    pub const MIN_CONFIDENCE: f64 = 0.1;

    /// An entry that holds only its raw text.
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            authors: Vec::new(),
            title: None,
            year: None,
            publisher: None,
            url: None,
            pages: None,
            edition: None,
            entry_type: None,
            parsed_as: None,
            confidence: Self::MIN_CONFIDENCE,
        }
    }
}

/// The two reading tiers a course bibliography is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BibliographyTier {
    Minimum,
    Supplementary,
}

impl BibliographyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Supplementary => "supplementary",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bibliography {
    pub minimum: Vec<BibliographyEntry>,
    pub supplementary: Vec<BibliographyEntry>,
}

impl Bibliography {
    /// Number of entries across both tiers.
    pub fn total_entries(&self) -> usize {
        self.minimum.len() + self.supplementary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    /// All entries in tier order, minimum first.
    pub fn entries(&self) -> impl Iterator<Item = (BibliographyTier, &BibliographyEntry)> {
        self.minimum
            .iter()
            .map(|e| (BibliographyTier::Minimum, e))
            .chain(
                self.supplementary
                    .iter()
                    .map(|e| (BibliographyTier::Supplementary, e)),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationItem {
    pub label: String,
    pub weight: f64,
}

/// Percentage-weighted evaluation items.
///
/// Labels are unique; inserting an existing label overwrites its weight in
/// place. `sums_to_100` is recomputed on every insert and is never set
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationScheme {
    items: Vec<EvaluationItem>,
    sums_to_100: bool,
    #[serde(skip)]
    tolerance: f64,
}

impl Default for EvaluationScheme {
    fn default() -> Self {
        Self::with_tolerance(Self::DEFAULT_TOLERANCE)
    }
}

impl EvaluationScheme {
    pub const DEFAULT_TOLERANCE: f64 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scheme whose sum check accepts `|total - 100| <= tolerance`.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            items: Vec::new(),
            sums_to_100: false,
            tolerance,
        }
    }

    pub fn insert(&mut self, label: impl Into<String>, weight: f64) {
        let label = label.into();
        match self.items.iter_mut().find(|item| item.label == label) {
            Some(existing) => existing.weight = weight,
            None => self.items.push(EvaluationItem { label, weight }),
        }
        self.sums_to_100 = (self.total() - 100.0).abs() <= self.tolerance;
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.items
            .iter()
            .find(|item| item.label == label)
            .map(|item| item.weight)
    }

    pub fn items(&self) -> &[EvaluationItem] {
        &self.items
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.weight).sum()
    }

    pub fn sums_to_100(&self) -> bool {
        self.sums_to_100
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for EvaluationScheme {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        let mut scheme = Self::default();
        for (label, weight) in iter {
            scheme.insert(label, weight);
        }
        scheme
    }
}

/// Issuing-institution lines found at the tail of a course document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstitutionalInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl InstitutionalInfo {
    pub fn is_empty(&self) -> bool {
        self.university.is_none()
            && self.faculty.is_none()
            && self.school.is_none()
            && self.institute.is_none()
            && self.date.is_none()
    }
}

/// Everything extracted from one course document.
///
/// A record is mutated only while its document is being processed. The
/// success flag is kept in step with the error list by [`add_error`](Self::add_error).
#[derive(Debug, Clone, Serialize)]
pub struct CourseRecord {
    pub filename: String,
    pub extracted_at: DateTime<Utc>,
    extraction_success: bool,
    extraction_errors: Vec<String>,
    pub metadata: CourseMetadata,
    pub description: Option<String>,
    pub outcomes: Vec<String>,
    pub contents: ContentOutline,
    pub methodology: Vec<String>,
    pub evaluation: EvaluationScheme,
    pub bibliography: Bibliography,
    pub institutional: InstitutionalInfo,
}

impl CourseRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            extracted_at: Utc::now(),
            extraction_success: true,
            extraction_errors: Vec::new(),
            metadata: CourseMetadata::default(),
            description: None,
            outcomes: Vec::new(),
            contents: ContentOutline::default(),
            methodology: Vec::new(),
            evaluation: EvaluationScheme::default(),
            bibliography: Bibliography::default(),
            institutional: InstitutionalInfo::default(),
        }
    }

    /// Record a structural failure; the record is no longer successful.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.extraction_errors.push(error.into());
        self.extraction_success = false;
    }

    pub fn errors(&self) -> &[String] {
        &self.extraction_errors
    }

    pub fn is_success(&self) -> bool {
        self.extraction_success
    }

    pub fn code(&self) -> Option<&str> {
        self.metadata.code.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn has_bibliography(&self) -> bool {
        !self.bibliography.is_empty()
    }

    /// Key used when records are collected into a map: the course code, or
    /// `unknown_<filename>` when no code was found.
    pub fn export_key(&self) -> String {
        match self.code() {
            Some(code) => code.to_string(),
            None => format!("unknown_{}", self.filename),
        }
    }

    pub fn summary(&self) -> CourseSummary {
        CourseSummary {
            code: self.metadata.code.clone(),
            name: self.metadata.name.clone(),
            filename: self.filename.clone(),
            extraction_success: self.extraction_success,
            bibliography_entries: self.bibliography.total_entries(),
            errors: self.extraction_errors.len(),
        }
    }
}

/// One-line view of a record for logs and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub code: Option<String>,
    pub name: Option<String>,
    pub filename: String,
    pub extraction_success: bool,
    pub bibliography_entries: usize,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_to_100_exact() {
        let scheme: EvaluationScheme = [("Tareas", 30.0), ("Interrogaciones", 30.0), ("Examen", 40.0)]
            .into_iter()
            .collect();
        assert!(scheme.sums_to_100());
    }

    #[test]
    fn test_sums_to_100_short() {
        let scheme: EvaluationScheme = [("A", 30.0), ("B", 30.0), ("C", 30.0)]
            .into_iter()
            .collect();
        assert!(!scheme.sums_to_100());
        assert!((scheme.total() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sums_to_100_within_tolerance() {
        let scheme: EvaluationScheme = [("A", 33.3), ("B", 33.3), ("C", 33.35)]
            .into_iter()
            .collect();
        assert!(scheme.sums_to_100(), "99.95 is within 0.1 of 100");
    }

    #[test]
    fn test_evaluation_last_label_wins() {
        let mut scheme = EvaluationScheme::new();
        scheme.insert("Tareas", 20.0);
        scheme.insert("Examen", 50.0);
        scheme.insert("Tareas", 50.0);
        assert_eq!(scheme.len(), 2);
        assert_eq!(scheme.get("Tareas"), Some(50.0));
        assert_eq!(scheme.items()[0].label, "Tareas");
        assert!(scheme.sums_to_100());
    }

    #[test]
    fn test_total_entries_is_derived() {
        let mut bib = Bibliography::default();
        assert_eq!(bib.total_entries(), 0);
        bib.minimum.push(BibliographyEntry::new("Smith, J. Some book. 2019."));
        bib.supplementary.push(BibliographyEntry::new("Doe, A. Other book. 2020."));
        bib.supplementary.push(BibliographyEntry::new("Roe, B. Third book. 2021."));
        assert_eq!(bib.total_entries(), bib.minimum.len() + bib.supplementary.len());
        let tiers: Vec<_> = bib.entries().map(|(t, _)| t).collect();
        assert_eq!(
            tiers,
            vec![
                BibliographyTier::Minimum,
                BibliographyTier::Supplementary,
                BibliographyTier::Supplementary
            ]
        );
    }

    #[test]
    fn test_add_error_flips_success() {
        let mut record = CourseRecord::new("IIC2233.pdf");
        assert!(record.is_success());
        record.add_error("could not read text");
        assert!(!record.is_success());
        assert_eq!(record.errors(), ["could not read text"]);
        assert_eq!(record.summary().errors, 1);
    }

    #[test]
    fn test_export_key_falls_back_to_filename() {
        let mut record = CourseRecord::new("broken.pdf");
        assert_eq!(record.export_key(), "unknown_broken.pdf");
        record.metadata.code = Some("MAT1610".into());
        assert_eq!(record.export_key(), "MAT1610");
    }

    #[test]
    fn test_new_entry_has_minimum_confidence() {
        let entry = BibliographyEntry::new("Anything at all here");
        assert!(entry.confidence >= BibliographyEntry::MIN_CONFIDENCE);
        assert_eq!(entry.raw_text, "Anything at all here");
    }

    #[test]
    fn test_record_serializes_derived_flags() {
        let mut record = CourseRecord::new("x.pdf");
        record.add_error("boom");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["extraction_success"], false);
        assert_eq!(json["extraction_errors"][0], "boom");
        assert_eq!(json["evaluation"]["sums_to_100"], false);
    }

    #[test]
    fn test_record_json_keeps_scalar_values() {
        let mut record = CourseRecord::new("iic2613.pdf");
        record.metadata.code = Some("IIC2613".into());
        record.metadata.credits = Some(10);
        record.evaluation.insert("Tareas", 12.5);
        record.evaluation.insert("Examen", 87.5);
        let mut entry = BibliographyEntry::new("Bishop, C. Pattern Recognition. Springer, 2006.");
        entry.year = Some(2006);
        entry.confidence = 0.95;
        record.bibliography.minimum.push(entry);

        let text = serde_json::to_string(&record).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["metadata"]["code"], "IIC2613");
        assert_eq!(json["metadata"]["credits"].as_u64(), Some(10));
        assert_eq!(json["evaluation"]["items"][0]["label"], "Tareas");
        assert_eq!(json["evaluation"]["items"][0]["weight"].as_f64(), Some(12.5));
        assert_eq!(json["evaluation"]["items"][1]["weight"].as_f64(), Some(87.5));
        assert_eq!(json["evaluation"]["sums_to_100"], true);
        let first = &json["bibliography"]["minimum"][0];
        assert_eq!(first["year"].as_u64(), Some(2006));
        assert_eq!(first["confidence"].as_f64(), Some(0.95));
    }
}
