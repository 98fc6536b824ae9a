use std::collections::HashMap;
use std::str::FromStr;

use regex::Regex;

use crate::scoring::ConfidenceWeights;
use crate::section::SectionKind;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// What to do with bibliography text that carries no "Minimum" label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnlabeledBibliography {
    /// Treat text before the "Supplementary" label (or the whole section)
    /// as the minimum list.
    #[default]
    Minimum,
    /// Leave the unlabeled text unclassified.
    Discard,
}

impl FromStr for UnlabeledBibliography {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimum" | "minima" => Ok(Self::Minimum),
            "discard" => Ok(Self::Discard),
            other => Err(format!(
                "unknown unlabeled-bibliography policy '{other}' (expected 'minimum' or 'discard')"
            )),
        }
    }
}

/// Configuration for the course extraction pipeline.
///
/// Regex overrides are `Option<Regex>` or absent map entries, meaning "use
/// the built-in default". Use [`ParsingConfigBuilder`] to construct with
/// string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── section.rs ──
    pub(crate) header_overrides: HashMap<SectionKind, Regex>,
    /// Literal lines that open the institutional tail of a document.
    pub(crate) institutional_markers: ListOverride<String>,
    pub(crate) minimum_label_re: Option<Regex>,
    pub(crate) supplementary_label_re: Option<Regex>,
    pub(crate) unlabeled_bibliography: UnlabeledBibliography,

    // ── segment.rs ──
    pub(crate) min_entry_chars: usize,

    // ── authors.rs ──
    pub(crate) max_authors: usize,

    // ── classify.rs ──
    pub(crate) publishers: ListOverride<String>,
    pub(crate) title_indicators: ListOverride<String>,
    pub(crate) early_exit_confidence: f64,
    pub(crate) confidence_weights: Option<ConfidenceWeights>,

    // ── content.rs ──
    pub(crate) min_methodology_chars: usize,
    pub(crate) sum_tolerance: f64,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            header_overrides: HashMap::new(),
            institutional_markers: ListOverride::Default,
            minimum_label_re: None,
            supplementary_label_re: None,
            unlabeled_bibliography: UnlabeledBibliography::default(),
            min_entry_chars: 10,
            max_authors: 5,
            publishers: ListOverride::Default,
            title_indicators: ListOverride::Default,
            early_exit_confidence: 0.9,
            confidence_weights: None,
            min_methodology_chars: 4,
            sum_tolerance: 0.1,
        }
    }
}

impl ParsingConfig {
    /// Get the author-year confidence weights, using defaults if not configured.
    pub(crate) fn confidence_weights(&self) -> ConfidenceWeights {
        self.confidence_weights.clone().unwrap_or_default()
    }

    pub fn max_authors(&self) -> usize {
        self.max_authors
    }

    pub fn min_entry_chars(&self) -> usize {
        self.min_entry_chars
    }

    pub fn unlabeled_bibliography(&self) -> UnlabeledBibliography {
        self.unlabeled_bibliography
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    header_overrides: Vec<(SectionKind, String)>,
    institutional_markers: ListOverride<String>,
    minimum_label_re: Option<String>,
    supplementary_label_re: Option<String>,
    unlabeled_bibliography: Option<UnlabeledBibliography>,
    min_entry_chars: Option<usize>,
    max_authors: Option<usize>,
    publishers: ListOverride<String>,
    title_indicators: ListOverride<String>,
    early_exit_confidence: Option<f64>,
    confidence_weights: Option<ConfidenceWeights>,
    min_methodology_chars: Option<usize>,
    sum_tolerance: Option<f64>,
}

fn push_extend(list: &mut ListOverride<String>, value: String) {
    match list {
        ListOverride::Extend(v) => v.push(value),
        _ => *list = ListOverride::Extend(vec![value]),
    }
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Sections ──

    /// Override the header regex for one section kind.
    pub fn header_regex(mut self, kind: SectionKind, pattern: &str) -> Self {
        self.header_overrides.push((kind, pattern.to_string()));
        self
    }

    pub fn set_institutional_markers(mut self, markers: Vec<String>) -> Self {
        self.institutional_markers = ListOverride::Replace(markers);
        self
    }

    pub fn add_institutional_marker(mut self, marker: String) -> Self {
        push_extend(&mut self.institutional_markers, marker);
        self
    }

    pub fn minimum_label_regex(mut self, pattern: &str) -> Self {
        self.minimum_label_re = Some(pattern.to_string());
        self
    }

    pub fn supplementary_label_regex(mut self, pattern: &str) -> Self {
        self.supplementary_label_re = Some(pattern.to_string());
        self
    }

    pub fn unlabeled_bibliography(mut self, policy: UnlabeledBibliography) -> Self {
        self.unlabeled_bibliography = Some(policy);
        self
    }

    // ── Scalars ──

    pub fn min_entry_chars(mut self, n: usize) -> Self {
        self.min_entry_chars = Some(n);
        self
    }

    pub fn max_authors(mut self, n: usize) -> Self {
        self.max_authors = Some(n);
        self
    }

    pub fn early_exit_confidence(mut self, threshold: f64) -> Self {
        self.early_exit_confidence = Some(threshold);
        self
    }

    pub fn min_methodology_chars(mut self, n: usize) -> Self {
        self.min_methodology_chars = Some(n);
        self
    }

    pub fn sum_tolerance(mut self, tolerance: f64) -> Self {
        self.sum_tolerance = Some(tolerance);
        self
    }

    // ── Publishers / title indicators ──

    pub fn set_publishers(mut self, publishers: Vec<String>) -> Self {
        self.publishers = ListOverride::Replace(publishers);
        self
    }

    pub fn add_publisher(mut self, publisher: String) -> Self {
        push_extend(&mut self.publishers, publisher);
        self
    }

    pub fn set_title_indicators(mut self, indicators: Vec<String>) -> Self {
        self.title_indicators = ListOverride::Replace(indicators);
        self
    }

    pub fn add_title_indicator(mut self, indicator: String) -> Self {
        push_extend(&mut self.title_indicators, indicator);
        self
    }

    // ── Confidence weights ──

    /// Set custom weights for the author-year strategy.
    pub fn confidence_weights(mut self, weights: ConfidenceWeights) -> Self {
        self.confidence_weights = Some(weights);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let header_overrides = self
            .header_overrides
            .into_iter()
            .map(|(kind, pattern)| Regex::new(&pattern).map(|re| (kind, re)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(ParsingConfig {
            header_overrides,
            institutional_markers: self.institutional_markers,
            minimum_label_re: compile(self.minimum_label_re)?,
            supplementary_label_re: compile(self.supplementary_label_re)?,
            unlabeled_bibliography: self.unlabeled_bibliography.unwrap_or_default(),
            min_entry_chars: self.min_entry_chars.unwrap_or(10),
            max_authors: self.max_authors.unwrap_or(5),
            publishers: self.publishers,
            title_indicators: self.title_indicators,
            early_exit_confidence: self.early_exit_confidence.unwrap_or(0.9),
            confidence_weights: self.confidence_weights,
            min_methodology_chars: self.min_methodology_chars.unwrap_or(4),
            sum_tolerance: self.sum_tolerance.unwrap_or(0.1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParsingConfig::default();
        assert_eq!(config.max_authors, 5);
        assert_eq!(config.min_entry_chars, 10);
        assert_eq!(config.min_methodology_chars, 4);
        assert!((config.early_exit_confidence - 0.9).abs() < f64::EPSILON);
        assert!((config.sum_tolerance - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.unlabeled_bibliography, UnlabeledBibliography::Minimum);
    }

    #[test]
    fn test_builder_basic() {
        let config = ParsingConfigBuilder::new()
            .max_authors(3)
            .min_entry_chars(20)
            .unlabeled_bibliography(UnlabeledBibliography::Discard)
            .build()
            .unwrap();
        assert_eq!(config.max_authors(), 3);
        assert_eq!(config.min_entry_chars(), 20);
        assert_eq!(config.unlabeled_bibliography(), UnlabeledBibliography::Discard);
    }

    #[test]
    fn test_builder_header_override() {
        let config = ParsingConfigBuilder::new()
            .header_regex(SectionKind::Bibliography, r"(?i)\bREFERENCIAS")
            .build()
            .unwrap();
        assert!(config.header_overrides.contains_key(&SectionKind::Bibliography));
        assert!(!config.header_overrides.contains_key(&SectionKind::Contents));
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = ParsingConfigBuilder::new()
            .minimum_label_regex(r"[invalid")
            .build();
        assert!(result.is_err());

        let result = ParsingConfigBuilder::new()
            .header_regex(SectionKind::Outcomes, r"(unclosed")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_extend_publishers() {
        let config = ParsingConfigBuilder::new()
            .add_publisher("alfaomega".to_string())
            .add_publisher("mcgraw-hill".to_string())
            .build()
            .unwrap();
        let resolved = config.publishers.resolve(&["springer".to_string()]);
        assert_eq!(resolved, vec!["springer", "alfaomega", "mcgraw-hill"]);
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_unlabeled_policy_from_str() {
        assert_eq!("minimum".parse::<UnlabeledBibliography>(), Ok(UnlabeledBibliography::Minimum));
        assert_eq!(" Discard ".parse::<UnlabeledBibliography>(), Ok(UnlabeledBibliography::Discard));
        assert!("keep".parse::<UnlabeledBibliography>().is_err());
    }
}
