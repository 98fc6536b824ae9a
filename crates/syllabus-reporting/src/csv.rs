use syllabus_core::{BibliographyEntry, CourseRecord};
use syllabus_parsing::BibliographyClassifier;

use crate::ExportError;

/// Quote a field when it contains a separator, quote or line break.
pub fn csv_escape(s: &str) -> String {
    if s.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line = fields
        .iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

fn opt_num<T: ToString>(v: Option<T>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

/// One row per course: code, name, credits, modules, character, types,
/// discipline, keywords, filename, success flag, bibliography flag and size.
pub fn metadata_csv(records: &[CourseRecord]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        &[
            "code",
            "name",
            "credits",
            "modules",
            "character",
            "types",
            "discipline",
            "keywords",
            "filename",
            "extraction_success",
            "has_bibliography",
            "total_bib_entries",
        ],
    );
    for r in records {
        let m = &r.metadata;
        push_row(
            &mut out,
            &[
                m.code.clone().unwrap_or_default(),
                m.name.clone().unwrap_or_default(),
                opt_num(m.credits),
                opt_num(m.modules),
                m.character.clone().unwrap_or_default(),
                m.types.join(";"),
                m.discipline.clone().unwrap_or_default(),
                m.keywords.join(";"),
                r.filename.clone(),
                r.is_success().to_string(),
                r.has_bibliography().to_string(),
                r.bibliography.total_entries().to_string(),
            ],
        );
    }
    out
}

/// One row per bibliography entry, minimum tier first within each course.
pub fn bibliography_csv(records: &[CourseRecord]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        &[
            "course_code",
            "course_name",
            "tier",
            "raw_text",
            "authors",
            "title",
            "year",
            "publisher",
            "url",
            "entry_type",
            "parsed_as",
            "confidence",
        ],
    );
    for r in records.iter().filter(|r| r.has_bibliography()) {
        for (tier, entry) in r.bibliography.entries() {
            push_row(
                &mut out,
                &[
                    r.code().unwrap_or_default().to_string(),
                    r.name().unwrap_or_default().to_string(),
                    tier.as_str().to_string(),
                    entry.raw_text.clone(),
                    entry.authors.join("; "),
                    entry.title.clone().unwrap_or_default(),
                    opt_num(entry.year),
                    entry.publisher.clone().unwrap_or_default(),
                    entry.url.clone().unwrap_or_default(),
                    entry
                        .entry_type
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_default(),
                    entry.parsed_as.map_or("", |s| s.as_str()).to_string(),
                    format!("{:.2}", entry.confidence),
                ],
            );
        }
    }
    out
}

/// Split CSV text into records.
///
/// Handles quoted fields with doubled quotes and embedded line breaks, and
/// CRLF line endings. Blank lines are skipped.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, ExportError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 0;
    let mut chars = text.chars().peekable();

    let mut finish = |record: &mut Vec<String>, field: &mut String| {
        record.push(std::mem::take(field));
        let done = std::mem::take(record);
        if !(done.len() == 1 && done[0].is_empty()) {
            records.push(done);
        }
    };

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                other => field.push(other),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish(&mut record, &mut field);
                line += 1;
            }
            other => field.push(other),
        }
    }

    if in_quotes {
        return Err(ExportError::MalformedCsv {
            line: quote_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !record.is_empty() {
        finish(&mut record, &mut field);
    }
    Ok(records)
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map_or("", String::as_str)
}

/// Re-run the classifier over the `raw_text` column of an exported
/// bibliography CSV.
///
/// Each row with a non-empty `raw_text` yields a cleaned row carrying the
/// fresh `authors_clean`, `title_clean`, `year_clean`, `publisher_clean`
/// and `confidence` values next to the original columns. Returns the
/// cleaned CSV and the number of rows written.
pub fn reclassify_csv(
    input: &str,
    classifier: &BibliographyClassifier,
) -> Result<(String, usize), ExportError> {
    let mut rows = parse_csv(input)?.into_iter();
    let header = rows.next().ok_or_else(|| ExportError::MalformedCsv {
        line: 1,
        reason: "missing header row".into(),
    })?;

    let column = |name: &str| header.iter().position(|h| h.trim() == name);
    let raw_idx = column("raw_text").ok_or_else(|| ExportError::MalformedCsv {
        line: 1,
        reason: "no raw_text column".into(),
    })?;
    let carried: Vec<Option<usize>> = [
        "course_code",
        "course_name",
        "tier",
        "authors",
        "title",
        "year",
        "publisher",
    ]
    .iter()
    .map(|name| column(name))
    .collect();

    let mut out = String::new();
    push_row(
        &mut out,
        &[
            "course_code",
            "course_name",
            "tier",
            "raw_text",
            "authors_clean",
            "title_clean",
            "year_clean",
            "publisher_clean",
            "confidence",
            "authors_original",
            "title_original",
            "year_original",
            "publisher_original",
        ],
    );

    let mut written = 0;
    for row in rows {
        let raw = cell(&row, Some(raw_idx)).trim();
        if raw.is_empty() {
            continue;
        }
        let entry: BibliographyEntry = classifier.classify(raw);
        let authors = entry.authors.join("; ");
        let year = opt_num(entry.year);
        let confidence = format!("{:.2}", entry.confidence);
        push_row(
            &mut out,
            &[
                cell(&row, carried[0]),
                cell(&row, carried[1]),
                cell(&row, carried[2]),
                raw,
                authors.as_str(),
                entry.title.as_deref().unwrap_or(""),
                year.as_str(),
                entry.publisher.as_deref().unwrap_or(""),
                confidence.as_str(),
                cell(&row, carried[3]),
                cell(&row, carried[4]),
                cell(&row, carried[5]),
                cell(&row, carried[6]),
            ],
        );
        written += 1;
    }

    tracing::info!(rows = written, "reclassified bibliography rows");
    Ok((out, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syllabus_core::CitationStyle;

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let text = "a,b,c\r\n\"x, y\",\"he said \"\"no\"\"\",\"multi\nline\"\n\n1,,3";
        let rows = parse_csv(text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["a", "b", "c"]);
        assert_eq!(rows[1], vec!["x, y", "he said \"no\"", "multi\nline"]);
        assert_eq!(rows[2], vec!["1", "", "3"]);
    }

    #[test]
    fn test_parse_csv_unterminated_quote() {
        let err = parse_csv("a,b\n1,\"open\n2,3\n").unwrap_err();
        match err {
            ExportError::MalformedCsv { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    fn course_with_entry() -> CourseRecord {
        let mut r = CourseRecord::new("iic2613.pdf");
        r.metadata.code = Some("IIC2613".into());
        r.metadata.name = Some("Aprendizaje, de Máquina".into());
        let mut entry = BibliographyEntry::new(
            "Bishop, C., \"Pattern Recognition and Machine Learning\", Springer, 2006.",
        );
        entry.authors = vec!["Bishop".into()];
        entry.year = Some(2006);
        entry.parsed_as = Some(CitationStyle::Ieee);
        entry.confidence = 0.95;
        r.bibliography.minimum.push(entry);
        r
    }

    #[test]
    fn test_metadata_csv_row() {
        let mut r = course_with_entry();
        r.metadata.credits = Some(10);
        r.metadata.types = vec!["Cátedra".into(), "Laboratorio".into()];
        let csv = metadata_csv(&[r]);
        let rows = parse_csv(&csv).unwrap();
        assert_eq!(rows[0][0], "code");
        assert_eq!(rows[1][1], "Aprendizaje, de Máquina");
        assert_eq!(rows[1][2], "10");
        assert_eq!(rows[1][3], "");
        assert_eq!(rows[1][5], "Cátedra;Laboratorio");
        assert_eq!(rows[1][11], "1");
    }

    #[test]
    fn test_bibliography_csv_rows() {
        let csv = bibliography_csv(&[course_with_entry(), CourseRecord::new("empty.pdf")]);
        let rows = parse_csv(&csv).unwrap();
        assert_eq!(rows.len(), 2);
        let row = &rows[1];
        assert_eq!(row[2], "minimum");
        assert!(row[3].contains("\"Pattern Recognition"));
        assert_eq!(row[6], "2006");
        assert_eq!(row[10], "ieee");
        assert_eq!(row[11], "0.95");
    }

    #[test]
    fn test_reclassify_exported_csv() {
        let csv = bibliography_csv(&[course_with_entry()]);
        let (cleaned, count) = reclassify_csv(&csv, &BibliographyClassifier::new()).unwrap();
        assert_eq!(count, 1);
        let rows = parse_csv(&cleaned).unwrap();
        assert_eq!(rows[0][4], "authors_clean");
        let row = &rows[1];
        assert_eq!(row[0], "IIC2613");
        assert_eq!(row[4], "Bishop");
        assert_eq!(row[5], "Pattern Recognition and Machine Learning");
        assert_eq!(row[6], "2006");
        assert_eq!(row[7], "Springer");
        assert_eq!(row[8], "0.95");
        assert_eq!(row[9], "Bishop");
    }

    #[test]
    fn test_reclassify_skips_blank_raw_text() {
        let input = "raw_text,title\n,orphan\n\"Knuth, D. The Art of Computer Programming. 1968.\",\n";
        let (cleaned, count) = reclassify_csv(input, &BibliographyClassifier::new()).unwrap();
        assert_eq!(count, 1);
        assert!(cleaned.contains("1968"));
    }

    #[test]
    fn test_reclassify_requires_raw_text_column() {
        let err = reclassify_csv("title,year\nA,2001\n", &BibliographyClassifier::new()).unwrap_err();
        assert!(matches!(err, ExportError::MalformedCsv { line: 1, .. }));
    }
}
