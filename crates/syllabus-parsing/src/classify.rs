//! Citation-style classification of bibliography entries.
//!
//! Each entry is run through an ordered list of [`CitationStrategy`]
//! implementations. A strategy reporting more than the early-exit confidence
//! ends the run; otherwise the highest-confidence parse wins. A failing
//! strategy counts as confidence 0 and the next one runs.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use syllabus_core::{BibliographyEntry, CitationStyle, EntryType};

use crate::authors::{extract_basic_authors, parse_authors_with_max};
use crate::config::ParsingConfig;
use crate::scoring::{
    APA_CONFIDENCE, ConfidenceWeights, FALLBACK_FOUND_CONFIDENCE, FieldsFound, IEEE_CONFIDENCE,
    MIN_CONFIDENCE,
};
use crate::text_processing::normalize_entry;

/// Publishers recognised by name, matched case-insensitively.
pub const DEFAULT_PUBLISHERS: &[&str] = &[
    "springer",
    "wiley",
    "elsevier",
    "mit press",
    "cambridge university press",
    "oxford university press",
    "ieee",
    "acm",
    "pearson",
    "o'reilly",
    "crc press",
    "taylor & francis",
    "sage",
    "academic press",
];

/// Phrases that usually sit inside a title.
pub const DEFAULT_TITLE_INDICATORS: &[&str] = &[
    "machine learning",
    "data mining",
    "artificial intelligence",
    "pattern recognition",
    "statistical learning",
    "deep learning",
    "introduction to",
    "handbook of",
    "fundamentals of",
];

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("year '{0}' is not a valid year")]
    InvalidYear(String),
}

fn parse_year(raw: &str) -> Result<u16, StrategyError> {
    raw.parse::<u16>()
        .map_err(|_| StrategyError::InvalidYear(raw.to_string()))
}

/// Fields recovered by one strategy, with its confidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryParse {
    pub authors: Vec<String>,
    pub title: Option<String>,
    pub year: Option<u16>,
    pub publisher: Option<String>,
    pub confidence: f64,
}

/// Read-only lookup tables shared by every strategy.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    publishers: Vec<Regex>,
    title_indicators: Vec<Regex>,
    max_authors: usize,
    weights: ConfidenceWeights,
}

fn compile_literals(literals: &[String], wrap: impl Fn(&str) -> String) -> Vec<Regex> {
    literals
        .iter()
        .filter_map(|lit| match Regex::new(&wrap(&regex::escape(lit))) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(literal = %lit, error = %e, "skipping lookup entry");
                None
            }
        })
        .collect()
}

impl StrategyContext {
    pub fn from_config(config: &ParsingConfig) -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let publishers = config.publishers.resolve(&owned(DEFAULT_PUBLISHERS));
        let indicators = config
            .title_indicators
            .resolve(&owned(DEFAULT_TITLE_INDICATORS));

        Self {
            publishers: compile_literals(&publishers, |p| format!(r"(?i)\b{p}\b")),
            title_indicators: compile_literals(&indicators, |i| format!(r"(?i)([^,.]*{i}[^,.]*)")),
            max_authors: config.max_authors,
            weights: config.confidence_weights(),
        }
    }

    pub fn weights(&self) -> &ConfidenceWeights {
        &self.weights
    }

    pub fn parse_authors(&self, text: &str) -> Vec<String> {
        parse_authors_with_max(text, self.max_authors)
    }

    /// Known-publisher lookup, widened to the surrounding phrase up to the
    /// nearest `.`, `,`, `;` or newline on each side. Falls back to a
    /// `, Something Press` style phrase.
    ///
    /// Names match case-insensitively on word boundaries, not as bare
    /// substrings: `sage` does not fire inside `message`, and a glued form
    /// such as `SpringerLink` is not recognized. The first name in list
    /// order wins.
    pub fn find_publisher(&self, text: &str) -> Option<String> {
        static PUBLISHER_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r",\s*(\p{Lu}[^,]*(?:Press|Publishers?|Books?|Ltd|Inc))").unwrap()
        });
        let is_stop = |c: char| matches!(c, '.' | ',' | ';' | '\n');

        for re in &self.publishers {
            if let Some(m) = re.find(text) {
                let end = text[m.end()..]
                    .find(is_stop)
                    .map_or(text.len(), |i| m.end() + i);
                let start = text[..m.start()].rfind(is_stop).map_or(0, |i| i + 1);
                let publisher = text[start..end].trim_matches(|c: char| " .,;".contains(c));
                if !publisher.is_empty() {
                    return Some(publisher.to_string());
                }
            }
        }

        PUBLISHER_SUFFIX_RE
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
    }

    /// The clause around the first title-indicator phrase found.
    pub fn find_indicator_title(&self, text: &str) -> Option<String> {
        self.title_indicators.iter().find_map(|re| {
            re.captures(text)
                .map(|caps| caps[1].trim().to_string())
                .filter(|t| !t.is_empty())
        })
    }
}

impl Default for StrategyContext {
    fn default() -> Self {
        Self::from_config(&ParsingConfig::default())
    }
}

/// One heuristic parser for a citation style.
pub trait CitationStrategy: Send + Sync {
    fn style(&self) -> CitationStyle;

    /// Parse normalized entry text. A non-matching entry yields confidence 0.
    fn parse(&self, text: &str, ctx: &StrategyContext) -> Result<EntryParse, StrategyError>;
}

/// `Author(s), "Title", Publisher, Year.`
pub struct IeeeStrategy;

impl CitationStrategy for IeeeStrategy {
    fn style(&self) -> CitationStyle {
        CitationStyle::Ieee
    }

    fn parse(&self, text: &str, ctx: &StrategyContext) -> Result<EntryParse, StrategyError> {
        static IEEE_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"^([^"]+),\s*"([^"]+)",\s*([^,]+),\s*(\d{4})"#).unwrap());

        let Some(caps) = IEEE_RE.captures(text) else {
            return Ok(EntryParse::default());
        };
        Ok(EntryParse {
            authors: ctx.parse_authors(caps[1].trim()),
            title: Some(caps[2].trim().to_string()),
            year: Some(parse_year(&caps[4])?),
            publisher: Some(caps[3].trim().to_string()),
            confidence: IEEE_CONFIDENCE,
        })
    }
}

/// `Author(s) (Year). Title. Publisher.`
pub struct ApaStrategy;

impl CitationStrategy for ApaStrategy {
    fn style(&self) -> CitationStyle {
        CitationStyle::Apa
    }

    fn parse(&self, text: &str, ctx: &StrategyContext) -> Result<EntryParse, StrategyError> {
        static APA_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^([^(]+)\s*\((\d{4})\)\.\s*([^.]+)\.\s*(.+)").unwrap());

        let Some(caps) = APA_RE.captures(text) else {
            return Ok(EntryParse::default());
        };
        let publisher = caps[4].trim().trim_end_matches(['.', ' ']).to_string();
        Ok(EntryParse {
            authors: ctx.parse_authors(caps[1].trim()),
            title: Some(caps[3].trim().to_string()),
            year: Some(parse_year(&caps[2])?),
            publisher: (!publisher.is_empty()).then_some(publisher),
            confidence: APA_CONFIDENCE,
        })
    }
}

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Flexible author-year reading; confidence grows with the fields found.
pub struct AuthorYearStrategy;

impl CitationStrategy for AuthorYearStrategy {
    fn style(&self) -> CitationStyle {
        CitationStyle::AuthorYear
    }

    fn parse(&self, text: &str, ctx: &StrategyContext) -> Result<EntryParse, StrategyError> {
        static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());

        let year_match = YEAR_RE.find(text);
        let year = year_match.map(|m| parse_year(m.as_str())).transpose()?;

        let quoted = QUOTED_RE.captures(text);
        let title = match &quoted {
            Some(caps) => Some(caps[1].trim().to_string()),
            None => ctx.find_indicator_title(text),
        };

        let publisher = ctx.find_publisher(text);

        let authors_text = match (year_match, quoted.as_ref().and_then(|c| c.get(0))) {
            (Some(y), _) => &text[..y.start()],
            (None, Some(q)) => &text[..q.start()],
            (None, None) => text,
        };
        let authors = ctx.parse_authors(authors_text);

        let confidence = ctx.weights().score(FieldsFound {
            year: year.is_some(),
            title: title.is_some(),
            publisher: publisher.is_some(),
            authors: !authors.is_empty(),
        });

        Ok(EntryParse {
            authors,
            title,
            year,
            publisher,
            confidence,
        })
    }
}

/// Recovers whatever it can: year, leading authors, publisher.
pub struct FallbackStrategy;

impl CitationStrategy for FallbackStrategy {
    fn style(&self) -> CitationStyle {
        CitationStyle::Fallback
    }

    fn parse(&self, text: &str, ctx: &StrategyContext) -> Result<EntryParse, StrategyError> {
        let year = YEAR_RE
            .find(text)
            .map(|m| parse_year(m.as_str()))
            .transpose()?;
        let authors = extract_basic_authors(text);
        let publisher = ctx.find_publisher(text);

        let confidence = if year.is_some() || !authors.is_empty() || publisher.is_some() {
            FALLBACK_FOUND_CONFIDENCE
        } else {
            MIN_CONFIDENCE
        };

        Ok(EntryParse {
            authors,
            title: None,
            year,
            publisher,
            confidence,
        })
    }
}

/// The built-in strategies, in dispatch order.
pub fn default_strategies() -> Vec<Box<dyn CitationStrategy>> {
    vec![
        Box::new(IeeeStrategy),
        Box::new(ApaStrategy),
        Box::new(AuthorYearStrategy),
        Box::new(FallbackStrategy),
    ]
}

/// Fill the fields no strategy looks for: URL, page range, edition and the
/// kind of work.
pub fn enrich_entry(entry: &mut BibliographyEntry, text: &str) {
    static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s)]+").unwrap());
    static PAGES_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bpp?\.\s*(\d+(?:\s*-\s*\d+)?)").unwrap());
    static EDITION_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(\d+)\s*(?:st|nd|rd|th|ª|º|°|a)?\.?\s*(?:ed\.|ed\b|edition\b|edici[oó]n\b)")
            .unwrap()
    });
    static PROCEEDINGS_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:proceedings|conference|congreso|symposium|workshop)\b|\bproc\.")
            .unwrap()
    });
    static ARTICLE_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:journal|revista|transactions|volume)\b|\bvol\.").unwrap()
    });

    entry.url = URL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string());
    entry.pages = PAGES_RE
        .captures(text)
        .map(|caps| caps[1].split_whitespace().collect::<String>());
    entry.edition = EDITION_RE.captures(text).map(|caps| caps[1].to_string());

    entry.entry_type = if entry.url.is_some() {
        Some(EntryType::Web)
    } else if PROCEEDINGS_RE.is_match(text) {
        Some(EntryType::InProceedings)
    } else if ARTICLE_RE.is_match(text) {
        Some(EntryType::Article)
    } else if entry.publisher.is_some() || entry.edition.is_some() {
        Some(EntryType::Book)
    } else {
        None
    };
}

/// Classifies raw reference strings into [`BibliographyEntry`] values.
pub struct BibliographyClassifier {
    strategies: Vec<Box<dyn CitationStrategy>>,
    ctx: StrategyContext,
    early_exit_confidence: f64,
}

impl Default for BibliographyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BibliographyClassifier {
    pub fn new() -> Self {
        Self::with_config(&ParsingConfig::default())
    }

    pub fn with_config(config: &ParsingConfig) -> Self {
        Self::with_strategies(config, default_strategies())
    }

    /// Use a custom ordered strategy list.
    pub fn with_strategies(config: &ParsingConfig, strategies: Vec<Box<dyn CitationStrategy>>) -> Self {
        Self {
            strategies,
            ctx: StrategyContext::from_config(config),
            early_exit_confidence: config.early_exit_confidence,
        }
    }

    pub fn context(&self) -> &StrategyContext {
        &self.ctx
    }

    /// Run the strategies on already normalized text and return the winner.
    pub fn best_parse(&self, text: &str) -> Option<(CitationStyle, EntryParse)> {
        let mut best: Option<(CitationStyle, EntryParse)> = None;

        for strategy in &self.strategies {
            let parse = match strategy.parse(text, &self.ctx) {
                Ok(parse) => parse,
                Err(e) => {
                    tracing::debug!(strategy = strategy.style().as_str(), error = %e, "strategy failed");
                    continue;
                }
            };
            let confidence = parse.confidence;
            let best_confidence = best.as_ref().map_or(0.0, |(_, b)| b.confidence);
            if confidence > best_confidence {
                best = Some((strategy.style(), parse));
            }
            if confidence > self.early_exit_confidence {
                break;
            }
        }
        best
    }

    /// Classify one raw reference. `raw_text` is kept verbatim and the
    /// confidence never drops below the minimum.
    pub fn classify(&self, raw: &str) -> BibliographyEntry {
        let text = normalize_entry(raw);
        let mut entry = BibliographyEntry::new(raw);

        match self.best_parse(&text) {
            Some((style, parse)) => {
                entry.authors = parse.authors;
                entry.title = parse.title;
                entry.year = parse.year;
                entry.publisher = parse.publisher;
                entry.confidence = parse.confidence.clamp(MIN_CONFIDENCE, 1.0);
                entry.parsed_as = Some(style);
            }
            None => {
                entry.authors = extract_basic_authors(&text);
                entry.confidence = MIN_CONFIDENCE;
                entry.parsed_as = Some(CitationStyle::Minimal);
            }
        }
        enrich_entry(&mut entry, &text);

        tracing::debug!(
            style = ?entry.parsed_as,
            confidence = entry.confidence,
            "classified bibliography entry"
        );
        entry
    }

    pub fn classify_all<S: AsRef<str>>(&self, raws: &[S]) -> Vec<BibliographyEntry> {
        raws.iter().map(|raw| self.classify(raw.as_ref())).collect()
    }
}
