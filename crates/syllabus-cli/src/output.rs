use std::io::Write;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use syllabus_core::{BibliographyEntry, CourseRecord, ExtractionReport};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn heading(w: &mut dyn Write, text: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", text.bold().cyan())
    } else {
        writeln!(w, "{}", text)
    }
}

fn field(w: &mut dyn Write, label: &str, value: Option<&str>) -> std::io::Result<()> {
    if let Some(value) = value {
        writeln!(w, "  {:<16}{}", format!("{label}:"), value)?;
    }
    Ok(())
}

/// Print one reference with its parsed fields.
pub fn print_entry(
    w: &mut dyn Write,
    index: Option<usize>,
    entry: &BibliographyEntry,
    color: ColorMode,
) -> std::io::Result<()> {
    let prefix = index.map(|i| format!("[{}] ", i + 1)).unwrap_or_default();
    let style = entry.parsed_as.map_or("", |s| s.as_str());
    let tag = format!("{} {:.2}", style, entry.confidence);
    if color.enabled() {
        let tag = if entry.confidence >= 0.9 {
            tag.green().to_string()
        } else if entry.confidence >= 0.5 {
            tag.yellow().to_string()
        } else {
            tag.red().to_string()
        };
        writeln!(w, "{}{} ({})", prefix, entry.raw_text, tag)?;
    } else {
        writeln!(w, "{}{} ({})", prefix, entry.raw_text, tag)?;
    }

    if !entry.authors.is_empty() {
        writeln!(w, "      Authors:   {}", entry.authors.join("; "))?;
    }
    if let Some(title) = &entry.title {
        writeln!(w, "      Title:     {}", title)?;
    }
    if let Some(year) = entry.year {
        writeln!(w, "      Year:      {}", year)?;
    }
    if let Some(publisher) = &entry.publisher {
        writeln!(w, "      Publisher: {}", publisher)?;
    }
    if let Some(url) = &entry.url {
        writeln!(w, "      URL:       {}", url)?;
    }
    if let Some(kind) = entry.entry_type {
        writeln!(w, "      Type:      {}", kind.as_str())?;
    }
    Ok(())
}

/// Human-readable dump of a course record.
pub fn print_course(w: &mut dyn Write, record: &CourseRecord, color: ColorMode) -> std::io::Result<()> {
    let title = format!(
        "{} - {}",
        record.code().unwrap_or("(no code)"),
        record.name().unwrap_or("(no name)")
    );
    heading(w, &title, color)?;
    writeln!(w, "  {}", record.filename)?;

    if !record.is_success() {
        for error in record.errors() {
            if color.enabled() {
                writeln!(w, "  {}", format!("error: {error}").red())?;
            } else {
                writeln!(w, "  error: {}", error)?;
            }
        }
        return Ok(());
    }

    let m = &record.metadata;
    let credits = m.credits.map(|c| c.to_string());
    let modules = m.modules.map(|c| c.to_string());
    let types = (!m.types.is_empty()).then(|| m.types.join(", "));
    let keywords = (!m.keywords.is_empty()).then(|| m.keywords.join(", "));
    field(w, "Translation", m.translation.as_deref())?;
    field(w, "Credits", credits.as_deref())?;
    field(w, "Modules", modules.as_deref())?;
    field(w, "Character", m.character.as_deref())?;
    field(w, "Type", types.as_deref())?;
    field(w, "Grading", m.grading.as_deref())?;
    field(w, "Discipline", m.discipline.as_deref())?;
    field(w, "Keywords", keywords.as_deref())?;
    field(w, "Level", m.level.as_deref())?;
    writeln!(w)?;

    if let Some(description) = &record.description {
        heading(w, "Description", color)?;
        writeln!(w, "  {}", description)?;
        writeln!(w)?;
    }

    if !record.outcomes.is_empty() {
        heading(w, "Learning outcomes", color)?;
        for (i, outcome) in record.outcomes.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, outcome)?;
        }
        writeln!(w)?;
    }

    if !record.contents.is_empty() {
        heading(w, "Contents", color)?;
        for node in record.contents.walk() {
            let indent = "  ".repeat(node.depth());
            writeln!(w, "{}{} {}", indent, node.number, node.title)?;
        }
        writeln!(w)?;
    }

    if !record.methodology.is_empty() {
        heading(w, "Methodology", color)?;
        for line in &record.methodology {
            writeln!(w, "  - {}", line)?;
        }
        writeln!(w)?;
    }

    if !record.evaluation.is_empty() {
        heading(w, "Evaluation", color)?;
        for item in record.evaluation.items() {
            writeln!(w, "  {:<40} {:>5.1}%", item.label, item.weight)?;
        }
        if !record.evaluation.sums_to_100() {
            let msg = format!("  weights sum to {:.1}%", record.evaluation.total());
            if color.enabled() {
                writeln!(w, "{}", msg.yellow())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
        writeln!(w)?;
    }

    for (label, entries) in [
        ("Minimum bibliography", &record.bibliography.minimum),
        ("Supplementary bibliography", &record.bibliography.supplementary),
    ] {
        if entries.is_empty() {
            continue;
        }
        heading(w, label, color)?;
        for (i, entry) in entries.iter().enumerate() {
            print_entry(w, Some(i), entry, color)?;
        }
        writeln!(w)?;
    }

    let info = &record.institutional;
    if !info.is_empty() {
        heading(w, "Institution", color)?;
        field(w, "University", info.university.as_deref())?;
        field(w, "Faculty", info.faculty.as_deref())?;
        field(w, "School", info.school.as_deref())?;
        field(w, "Institute", info.institute.as_deref())?;
        field(w, "Date", info.date.as_deref())?;
    }
    Ok(())
}

/// Print the batch summary and the list of written files.
pub fn print_batch_summary(
    w: &mut dyn Write,
    report: &ExtractionReport,
    written: &[PathBuf],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    heading(w, "Extraction summary", color)?;
    writeln!(w, "  Files processed:        {}", report.total_files)?;
    writeln!(
        w,
        "  Successful extractions: {} ({:.1}%)",
        report.successful_extractions, report.success_rate
    )?;
    writeln!(
        w,
        "  With bibliography:      {} ({:.1}%)",
        report.courses_with_bibliography, report.bibliography_coverage
    )?;
    writeln!(
        w,
        "  Bibliography entries:   {} (avg {:.1} per course)",
        report.total_bibliography_entries, report.avg_entries_per_course
    )?;

    if !report.common_errors.is_empty() {
        writeln!(w)?;
        heading(w, "Most common errors", color)?;
        for error in &report.common_errors {
            if color.enabled() {
                writeln!(w, "  {:>4}x {}", error.count, error.message.red())?;
            } else {
                writeln!(w, "  {:>4}x {}", error.count, error.message)?;
            }
        }
    }

    writeln!(w)?;
    heading(w, "Written files", color)?;
    for path in written {
        if color.enabled() {
            writeln!(w, "  {}", path.display().dimmed())?;
        } else {
            writeln!(w, "  {}", path.display())?;
        }
    }
    Ok(())
}
