use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
    pub parsing: Option<ParsingSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub dir: Option<String>,
    /// File extensions picked up by a batch run, without the dot.
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: Option<String>,
    /// `json`, `csv` or `both`.
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsingSection {
    pub max_authors: Option<usize>,
    pub min_entry_chars: Option<usize>,
    /// `minimum` or `discard`.
    pub unlabeled_bibliography: Option<String>,
    pub extra_publishers: Option<Vec<String>>,
    pub extra_title_indicators: Option<Vec<String>>,
}

/// Platform config directory path: `<config_dir>/syllabus/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("syllabus").join("config.toml"))
}

/// Load config by cascading CWD `.syllabus.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".syllabus.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

fn pick<S, T: Clone>(
    overlay: Option<&S>,
    base: Option<&S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bi, oi) = (base.input.as_ref(), overlay.input.as_ref());
    let (bo, oo) = (base.output.as_ref(), overlay.output.as_ref());
    let (bp, op) = (base.parsing.as_ref(), overlay.parsing.as_ref());

    ConfigFile {
        input: Some(InputConfig {
            dir: pick(oi, bi, |i| i.dir.clone()),
            extensions: pick(oi, bi, |i| i.extensions.clone()),
        }),
        output: Some(OutputConfig {
            dir: pick(oo, bo, |o| o.dir.clone()),
            format: pick(oo, bo, |o| o.format.clone()),
        }),
        parsing: Some(ParsingSection {
            max_authors: pick(op, bp, |p| p.max_authors),
            min_entry_chars: pick(op, bp, |p| p.min_entry_chars),
            unlabeled_bibliography: pick(op, bp, |p| p.unlabeled_bibliography.clone()),
            extra_publishers: pick(op, bp, |p| p.extra_publishers.clone()),
            extra_title_indicators: pick(op, bp, |p| p.extra_title_indicators.clone()),
        }),
    }
}
