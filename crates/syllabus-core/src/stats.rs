use std::collections::HashMap;

use serde::Serialize;

use crate::model::CourseRecord;

/// Number of distinct error messages kept in a report.
pub const TOP_ERRORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCount {
    pub message: String,
    pub count: usize,
}

/// Batch-level summary over a set of course records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub total_files: usize,
    pub successful_extractions: usize,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
    pub courses_with_bibliography: usize,
    /// Percentage of all files whose record has at least one reference.
    pub bibliography_coverage: f64,
    pub total_bibliography_entries: usize,
    /// Averaged over courses that have a bibliography.
    pub avg_entries_per_course: f64,
    pub common_errors: Vec<ErrorCount>,
}

/// Accumulates counters as records finish extraction.
///
/// Only finished records are fed in, so the collector never observes a
/// record mid-extraction.
#[derive(Debug, Default, Clone)]
pub struct BatchStats {
    total_files: usize,
    successful: usize,
    with_bibliography: usize,
    bibliography_entries: usize,
    errors: HashMap<String, usize>,
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &CourseRecord) {
        self.total_files += 1;
        if record.is_success() {
            self.successful += 1;
        }
        if record.has_bibliography() {
            self.with_bibliography += 1;
            self.bibliography_entries += record.bibliography.total_entries();
        }
        for error in record.errors() {
            *self.errors.entry(error.clone()).or_default() += 1;
        }
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn report(&self) -> ExtractionReport {
        let mut common_errors: Vec<ErrorCount> = self
            .errors
            .iter()
            .map(|(message, count)| ErrorCount {
                message: message.clone(),
                count: *count,
            })
            .collect();
        common_errors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.message.cmp(&b.message)));
        common_errors.truncate(TOP_ERRORS);

        let avg_entries_per_course = if self.with_bibliography == 0 {
            0.0
        } else {
            self.bibliography_entries as f64 / self.with_bibliography as f64
        };

        ExtractionReport {
            total_files: self.total_files,
            successful_extractions: self.successful,
            success_rate: percentage(self.successful, self.total_files),
            courses_with_bibliography: self.with_bibliography,
            bibliography_coverage: percentage(self.with_bibliography, self.total_files),
            total_bibliography_entries: self.bibliography_entries,
            avg_entries_per_course,
            common_errors,
        }
    }
}

/// Build a report over an already collected batch.
pub fn extraction_report(records: &[CourseRecord]) -> ExtractionReport {
    let mut stats = BatchStats::new();
    for record in records {
        stats.record(record);
    }
    stats.report()
}
