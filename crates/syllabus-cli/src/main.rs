use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use syllabus_core::{BatchStats, CourseRecord, TextBackend, config_file};
use syllabus_parsing::{CourseExtractor, PlainTextBackend, UnlabeledBibliography};
use syllabus_pdf_mupdf::MupdfBackend;
use syllabus_reporting::ExportFormat;

mod output;
mod settings;

use output::ColorMode;
use settings::BatchSettings;

/// Number of courses listed after a batch, by bibliography size.
const TOP_COURSES: usize = 5;

/// Course Syllabus Extractor - Turn course program documents into structured records
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract every course document in a directory and export the results
    Extract {
        /// Directory holding the course PDFs (or .txt dumps)
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Directory for the exported files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Export format: json, csv or both
        #[arg(long)]
        format: Option<ExportFormat>,

        /// What to do with an unlabeled bibliography: minimum or discard
        #[arg(long)]
        unlabeled_bibliography: Option<UnlabeledBibliography>,

        /// Maximum authors kept per reference
        #[arg(long)]
        max_authors: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Extract a single course document and print it
    Show {
        /// Path to the PDF or .txt file
        file_path: PathBuf,

        /// Print the record as JSON instead of a readable summary
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Classify a single raw reference string
    Classify {
        /// The reference text (quote it, or pass it as several words)
        #[arg(required = true, num_args = 1..)]
        reference: Vec<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Re-run classification over an exported bibliography CSV
    Reclassify {
        /// Path to a bibliography CSV written by `extract`
        csv_path: PathBuf,

        /// Output path (default: <input>_clean.csv next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let directive = if debug {
        "syllabus=debug"
    } else {
        "syllabus=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let file_config = config_file::load_config();

    match cli.command {
        Command::Extract {
            input_dir,
            output_dir,
            format,
            unlabeled_bibliography,
            max_authors,
            no_color,
        } => {
            let batch = BatchSettings::resolve(&file_config, input_dir, output_dir, format)?;
            let config =
                settings::parsing_config(&file_config, unlabeled_bibliography, max_authors)?;
            extract(
                &batch,
                CourseExtractor::with_config(config),
                ColorMode(!no_color),
            )
        }
        Command::Show {
            file_path,
            json,
            no_color,
        } => {
            let extractor =
                CourseExtractor::with_config(settings::parsing_config(&file_config, None, None)?);
            show(&file_path, &extractor, json, ColorMode(!no_color))
        }
        Command::Classify {
            reference,
            no_color,
        } => {
            let extractor =
                CourseExtractor::with_config(settings::parsing_config(&file_config, None, None)?);
            let entry = extractor.classify_entry(&reference.join(" "));
            let mut stdout = std::io::stdout();
            output::print_entry(&mut stdout, None, &entry, ColorMode(!no_color))?;
            Ok(())
        }
        Command::Reclassify { csv_path, output } => {
            let extractor =
                CourseExtractor::with_config(settings::parsing_config(&file_config, None, None)?);
            reclassify(&csv_path, output, &extractor)
        }
    }
}

/// Pick a backend by file extension: `.txt` dumps are read directly,
/// everything else goes through MuPDF.
fn backend_for(path: &Path) -> Box<dyn TextBackend> {
    let is_txt = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    if is_txt {
        Box::new(PlainTextBackend::new())
    } else {
        Box::new(MupdfBackend::new())
    }
}

/// Files in `dir` whose extension is in `extensions`, sorted by name.
fn collect_documents(dir: &Path, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", dir.display());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .is_some_and(|e| extensions.contains(&e))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// The `n` records with the most bibliography entries, largest first.
fn top_by_bibliography(records: &[CourseRecord], n: usize) -> Vec<&CourseRecord> {
    let mut with_bib: Vec<&CourseRecord> = records.iter().filter(|r| r.has_bibliography()).collect();
    with_bib.sort_by(|a, b| {
        b.bibliography
            .total_entries()
            .cmp(&a.bibliography.total_entries())
    });
    with_bib.truncate(n);
    with_bib
}

fn extract(batch: &BatchSettings, extractor: CourseExtractor, color: ColorMode) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let files = collect_documents(&batch.input_dir, &batch.extensions)?;
    if files.is_empty() {
        anyhow::bail!(
            "No course documents ({}) found in {}",
            batch.extensions.join(", "),
            batch.input_dir.display()
        );
    }

    tracing::info!(
        input = %batch.input_dir.display(),
        output = %batch.output_dir.display(),
        files = files.len(),
        "starting extraction"
    );

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut stats = BatchStats::new();
    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(name);
        let backend = backend_for(path);
        let record = extractor.extract_from_path(path, backend.as_ref());
        stats.record(&record);
        records.push(record);
        bar.inc(1);
    }
    bar.finish_and_clear();

    let report = stats.report();
    tracing::info!(
        files = report.total_files,
        successful = report.successful_extractions,
        success_rate = report.success_rate,
        with_bibliography = report.courses_with_bibliography,
        coverage = report.bibliography_coverage,
        entries = report.total_bibliography_entries,
        "extraction finished"
    );

    let written = syllabus_reporting::export_batch(
        &records,
        &report,
        &batch.output_dir,
        batch.format,
        &syllabus_reporting::timestamp(),
    )?;

    for (rank, record) in top_by_bibliography(&records, TOP_COURSES).iter().enumerate() {
        tracing::info!(
            rank = rank + 1,
            code = record.code().unwrap_or("-"),
            name = record.name().unwrap_or("-"),
            entries = record.bibliography.total_entries(),
            "top course by bibliography"
        );
    }

    let mut stdout = std::io::stdout();
    output::print_batch_summary(&mut stdout, &report, &written, color)?;
    stdout.flush()?;
    Ok(())
}

fn show(path: &Path, extractor: &CourseExtractor, json: bool, color: ColorMode) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let backend = backend_for(path);
    let record = extractor.extract_from_path(path, backend.as_ref());

    let mut stdout = std::io::stdout();
    if json {
        writeln!(stdout, "{}", syllabus_reporting::course_json(&record)?)?;
    } else {
        output::print_course(&mut stdout, &record, color)?;
    }
    Ok(())
}

fn default_clean_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bibliography".to_string());
    input.with_file_name(format!("{stem}_clean.csv"))
}

fn reclassify(
    csv_path: &Path,
    output: Option<PathBuf>,
    extractor: &CourseExtractor,
) -> anyhow::Result<()> {
    if !csv_path.exists() {
        anyhow::bail!("File not found: {}", csv_path.display());
    }
    let input = std::fs::read_to_string(csv_path)?;
    let (cleaned, rows) = syllabus_reporting::reclassify_csv(&input, extractor.classifier())?;

    let output = output.unwrap_or_else(|| default_clean_path(csv_path));
    syllabus_reporting::write_output(&output, &cleaned)?;
    println!("Reclassified {} entries -> {}", rows, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syllabus_core::BibliographyEntry;

    #[test]
    fn test_collect_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.md", "c.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let files = collect_documents(dir.path(), &["pdf".into(), "txt".into()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf", "c.txt"]);
    }

    #[test]
    fn test_collect_documents_missing_dir() {
        assert!(collect_documents(Path::new("/no/such/dir"), &["pdf".into()]).is_err());
    }

    #[test]
    fn test_top_by_bibliography() {
        let mut records = Vec::new();
        for (file, n) in [("a.pdf", 1), ("b.pdf", 0), ("c.pdf", 3), ("d.pdf", 2)] {
            let mut r = CourseRecord::new(file);
            for i in 0..n {
                r.bibliography
                    .minimum
                    .push(BibliographyEntry::new(format!("Reference {i}, 2000.")));
            }
            records.push(r);
        }
        let top: Vec<_> = top_by_bibliography(&records, 2)
            .iter()
            .map(|r| r.filename.as_str())
            .collect();
        assert_eq!(top, vec!["c.pdf", "d.pdf"]);
    }

    #[test]
    fn test_default_clean_path() {
        assert_eq!(
            default_clean_path(Path::new("data/bibliography_20240301.csv")),
            PathBuf::from("data/bibliography_20240301_clean.csv")
        );
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "syllabus",
            "extract",
            "--format",
            "csv",
            "--unlabeled-bibliography",
            "discard",
        ])
        .unwrap();
        match cli.command {
            Command::Extract {
                format,
                unlabeled_bibliography,
                ..
            } => {
                assert_eq!(format, Some(ExportFormat::Csv));
                assert_eq!(unlabeled_bibliography, Some(UnlabeledBibliography::Discard));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["syllabus", "--debug", "classify", "Knuth,", "D."]).unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Classify { ref reference, .. } if reference.len() == 2));
    }
}
