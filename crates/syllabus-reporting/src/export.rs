use std::collections::BTreeMap;

use serde::Serialize;

use syllabus_core::{Bibliography, CourseRecord, CourseSummary, ExtractionReport};

use crate::ExportError;

/// Pretty JSON for a single course record. Non-ASCII text is kept as is.
pub fn course_json(record: &CourseRecord) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// All records in one object keyed by [`CourseRecord::export_key`].
///
/// Keys are sorted; a later record with the same key replaces an earlier one.
pub fn batch_json(records: &[CourseRecord]) -> Result<String, ExportError> {
    let mut by_key = BTreeMap::new();
    for record in records {
        if by_key.insert(record.export_key(), record).is_some() {
            tracing::warn!(key = %record.export_key(), file = %record.filename, "duplicate course key; keeping last");
        }
    }
    Ok(serde_json::to_string_pretty(&by_key)?)
}

#[derive(Serialize)]
struct BibliographySummary<'a> {
    name: Option<&'a str>,
    code: Option<&'a str>,
    bibliography: &'a Bibliography,
    total_entries: usize,
}

/// Bibliography of every course that has one, keyed by code (or filename).
pub fn bibliography_summary_json(records: &[CourseRecord]) -> Result<String, ExportError> {
    let summary: BTreeMap<&str, BibliographySummary<'_>> = records
        .iter()
        .filter(|r| r.has_bibliography())
        .map(|r| {
            let key = r.code().unwrap_or(&r.filename);
            let entry = BibliographySummary {
                name: r.name(),
                code: r.code(),
                bibliography: &r.bibliography,
                total_entries: r.bibliography.total_entries(),
            };
            (key, entry)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&summary)?)
}

#[derive(Serialize)]
struct FailedCourse<'a> {
    filename: &'a str,
    code: Option<&'a str>,
    errors: &'a [String],
}

#[derive(Serialize)]
struct BibliographyBreakdown<'a> {
    code: Option<&'a str>,
    name: Option<&'a str>,
    minimum_entries: usize,
    supplementary_entries: usize,
    total: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a ExtractionReport,
    courses: Vec<CourseSummary>,
    failed_courses: Vec<FailedCourse<'a>>,
    bibliography_breakdown: Vec<BibliographyBreakdown<'a>>,
}

/// Extraction report: the batch summary, one summary per course, the
/// failed courses with their errors, and per-course bibliography counts.
pub fn report_json(
    records: &[CourseRecord],
    summary: &ExtractionReport,
) -> Result<String, ExportError> {
    let report = Report {
        summary,
        courses: records.iter().map(CourseRecord::summary).collect(),
        failed_courses: records
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| FailedCourse {
                filename: &r.filename,
                code: r.code(),
                errors: r.errors(),
            })
            .collect(),
        bibliography_breakdown: records
            .iter()
            .filter(|r| r.has_bibliography())
            .map(|r| BibliographyBreakdown {
                code: r.code(),
                name: r.name(),
                minimum_entries: r.bibliography.minimum.len(),
                supplementary_entries: r.bibliography.supplementary.len(),
                total: r.bibliography.total_entries(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use syllabus_core::{BibliographyEntry, extraction_report};

    fn record(file: &str, code: Option<&str>, entries: usize) -> CourseRecord {
        let mut r = CourseRecord::new(file);
        r.metadata.code = code.map(str::to_string);
        r.metadata.name = Some("Cálculo".into());
        for i in 0..entries {
            r.bibliography
                .supplementary
                .push(BibliographyEntry::new(format!("Entry number {i}, 2001.")));
        }
        r
    }

    #[test]
    fn test_course_json_keeps_non_ascii() {
        let json = course_json(&record("a.pdf", Some("MAT1"), 0)).unwrap();
        assert!(json.contains("Cálculo"));
        assert!(json.contains('\n'), "expected pretty output");
    }

    #[test]
    fn test_batch_keys_fall_back_to_filename() {
        let records = vec![record("x.pdf", None, 0), record("b.pdf", Some("MAT2"), 1)];
        let value: Value = serde_json::from_str(&batch_json(&records).unwrap()).unwrap();
        assert!(value.get("MAT2").is_some());
        assert_eq!(value["unknown_x.pdf"]["filename"], "x.pdf");
    }

    #[test]
    fn test_batch_duplicate_key_last_wins() {
        let records = vec![record("first.pdf", Some("DUP"), 0), record("second.pdf", Some("DUP"), 0)];
        let value: Value = serde_json::from_str(&batch_json(&records).unwrap()).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        assert_eq!(value["DUP"]["filename"], "second.pdf");
    }

    #[test]
    fn test_bibliography_summary_skips_empty() {
        let records = vec![record("a.pdf", Some("A1"), 0), record("b.pdf", None, 2)];
        let value: Value =
            serde_json::from_str(&bibliography_summary_json(&records).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(value["b.pdf"]["total_entries"], 2);
        assert_eq!(
            value["b.pdf"]["bibliography"]["supplementary"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn test_report_sections() {
        let mut failed = record("bad.pdf", None, 0);
        failed.add_error("text extraction failed");
        let records = vec![record("a.pdf", Some("A1"), 3), failed];
        let summary = extraction_report(&records);
        let value: Value = serde_json::from_str(&report_json(&records, &summary).unwrap()).unwrap();

        assert_eq!(value["summary"]["total_files"], 2);
        assert_eq!(value["courses"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["failed_courses"][0]["filename"], "bad.pdf");
        assert_eq!(value["failed_courses"][0]["errors"][0], "text extraction failed");
        assert_eq!(value["bibliography_breakdown"][0]["supplementary_entries"], 3);
        assert_eq!(value["bibliography_breakdown"][0]["total"], 3);
    }
}
