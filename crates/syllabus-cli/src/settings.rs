use std::path::PathBuf;

use syllabus_core::config_file::ConfigFile;
use syllabus_parsing::{ParsingConfig, ParsingConfigBuilder, UnlabeledBibliography};
use syllabus_reporting::ExportFormat;

pub const DEFAULT_INPUT_DIR: &str = "output";
pub const DEFAULT_OUTPUT_DIR: &str = "data/extracted";
pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "txt"];

pub const INPUT_DIR_ENV: &str = "SYLLABUS_INPUT_DIR";
pub const OUTPUT_DIR_ENV: &str = "SYLLABUS_OUTPUT_DIR";

/// Flag > environment > config file > default.
pub fn resolve_dir(
    flag: Option<PathBuf>,
    env: Option<String>,
    file: Option<&str>,
    default: &str,
) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .or_else(|| file.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Resolved settings for a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: ExportFormat,
    pub extensions: Vec<String>,
}

impl BatchSettings {
    pub fn resolve(
        file: &ConfigFile,
        input_flag: Option<PathBuf>,
        output_flag: Option<PathBuf>,
        format_flag: Option<ExportFormat>,
    ) -> anyhow::Result<Self> {
        let input = file.input.as_ref();
        let output = file.output.as_ref();

        let format = match format_flag {
            Some(format) => format,
            None => match output.and_then(|o| o.format.as_deref()) {
                Some(raw) => raw.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                None => ExportFormat::default(),
            },
        };

        let extensions = input
            .and_then(|i| i.extensions.clone())
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect())
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Ok(Self {
            input_dir: resolve_dir(
                input_flag,
                std::env::var(INPUT_DIR_ENV).ok(),
                input.and_then(|i| i.dir.as_deref()),
                DEFAULT_INPUT_DIR,
            ),
            output_dir: resolve_dir(
                output_flag,
                std::env::var(OUTPUT_DIR_ENV).ok(),
                output.and_then(|o| o.dir.as_deref()),
                DEFAULT_OUTPUT_DIR,
            ),
            format,
            extensions,
        })
    }
}

/// Build the parsing config from the `[parsing]` section, then apply the
/// command-line overrides on top.
pub fn parsing_config(
    file: &ConfigFile,
    unlabeled_flag: Option<UnlabeledBibliography>,
    max_authors_flag: Option<usize>,
) -> anyhow::Result<ParsingConfig> {
    let mut builder = ParsingConfigBuilder::new();

    if let Some(section) = &file.parsing {
        if let Some(n) = section.max_authors {
            builder = builder.max_authors(n);
        }
        if let Some(n) = section.min_entry_chars {
            builder = builder.min_entry_chars(n);
        }
        if let Some(raw) = &section.unlabeled_bibliography {
            let policy: UnlabeledBibliography = raw.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            builder = builder.unlabeled_bibliography(policy);
        }
        for publisher in section.extra_publishers.iter().flatten() {
            builder = builder.add_publisher(publisher.clone());
        }
        for indicator in section.extra_title_indicators.iter().flatten() {
            builder = builder.add_title_indicator(indicator.clone());
        }
    }

    if let Some(policy) = unlabeled_flag {
        builder = builder.unlabeled_bibliography(policy);
    }
    if let Some(n) = max_authors_flag {
        builder = builder.max_authors(n);
    }

    Ok(builder.build()?)
}
