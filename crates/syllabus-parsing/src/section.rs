use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{ParsingConfig, UnlabeledBibliography};

/// The named sections of a course document, in the order they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Description,
    Outcomes,
    Contents,
    Methodology,
    Evaluation,
    Bibliography,
    Institutional,
}

impl SectionKind {
    /// Academic sections, headed by a roman numeral.
    pub const ACADEMIC: [SectionKind; 6] = [
        SectionKind::Description,
        SectionKind::Outcomes,
        SectionKind::Contents,
        SectionKind::Methodology,
        SectionKind::Evaluation,
        SectionKind::Bibliography,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Outcomes => "outcomes",
            Self::Contents => "contents",
            Self::Methodology => "methodology",
            Self::Evaluation => "evaluation",
            Self::Bibliography => "bibliography",
            Self::Institutional => "institutional",
        }
    }
}

/// A labeled sub-range of the normalized document text.
///
/// `start` is the offset right after the header and `end` the offset of the
/// next found header (or the end of the document). `header_start <= start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub kind: SectionKind,
    pub header_start: usize,
    pub start: usize,
    pub end: usize,
}

impl SectionSpan {
    /// Borrow the section body from the text the span was located in.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

static DEFAULT_HEADERS: Lazy<Vec<(SectionKind, Regex)>> = Lazy::new(|| {
    [
        (SectionKind::Description, r"(?i)\bI\s*\.\s*DESCRIPCI[OÓ]N\s+DEL\s+CURSO"),
        (SectionKind::Outcomes, r"(?i)\bII\s*\.\s*RESULTADOS\s+DE\s+APRENDIZAJE"),
        (SectionKind::Contents, r"(?i)\bIII\s*\.\s*CONTENIDOS"),
        (SectionKind::Methodology, r"(?i)\bIV\s*\.\s*ESTRATEGIAS\s+METODOL[OÓ]GICAS"),
        (SectionKind::Evaluation, r"(?i)\bV\s*\.\s*ESTRATEGIAS\s+EVALUATIVAS"),
        (SectionKind::Bibliography, r"(?i)\bVI\s*\.\s*BIBLIOGRAF[IÍ]A"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).unwrap()))
    .collect()
});

/// Lines that open the institutional tail of a document.
pub const DEFAULT_INSTITUTIONAL_MARKERS: &[&str] = &[
    "PONTIFICIA UNIVERSIDAD",
    "FACULTAD DE",
    "ESCUELA DE",
    "INSTITUTO DE",
];

static DEFAULT_INSTITUTIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    let markers: Vec<String> = DEFAULT_INSTITUTIONAL_MARKERS
        .iter()
        .map(|s| s.to_string())
        .collect();
    Regex::new(&marker_pattern(&markers)).unwrap()
});

/// Build a line-anchored, case-insensitive alternation over literal markers.
/// Inner spaces match any whitespace run.
fn marker_pattern(markers: &[String]) -> String {
    let alternation = markers
        .iter()
        .map(|m| {
            m.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?im)^[ \t]*(?:{alternation})")
}

fn institutional_regex(config: &ParsingConfig) -> Option<Regex> {
    if let Some(re) = config.header_overrides.get(&SectionKind::Institutional) {
        return Some(re.clone());
    }
    if matches!(
        config.institutional_markers,
        crate::config::ListOverride::Default
    ) {
        return Some(DEFAULT_INSTITUTIONAL_RE.clone());
    }

    let defaults: Vec<String> = DEFAULT_INSTITUTIONAL_MARKERS
        .iter()
        .map(|s| s.to_string())
        .collect();
    let markers = config.institutional_markers.resolve(&defaults);
    if markers.is_empty() {
        return None;
    }
    match Regex::new(&marker_pattern(&markers)) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "institutional markers do not compile; tail not located");
            None
        }
    }
}

/// Locate every known section in `text`, in document order.
pub fn locate_all(text: &str) -> Vec<SectionSpan> {
    locate_all_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`locate_all`].
///
/// Headers are searched in sequence order, each search starting after the
/// previous found header, so spans never overlap and never run backwards.
/// The institutional marker is only searched after the last academic header.
pub(crate) fn locate_all_with_config(text: &str, config: &ParsingConfig) -> Vec<SectionSpan> {
    // (kind, header_start, body_start)
    let mut headers: Vec<(SectionKind, usize, usize)> = Vec::new();
    let mut cursor = 0;

    for (kind, default_re) in DEFAULT_HEADERS.iter() {
        let re = config.header_overrides.get(kind).unwrap_or(default_re);
        match re.find_at(text, cursor) {
            Some(m) => {
                headers.push((*kind, m.start(), m.end()));
                cursor = m.end();
            }
            None => tracing::debug!(section = kind.label(), "section header not found"),
        }
    }

    if let Some(m) = institutional_regex(config).and_then(|re| re.find_at(text, cursor)) {
        // The marker line is part of the institutional block itself.
        headers.push((SectionKind::Institutional, m.start(), m.start()));
    }

    headers
        .iter()
        .enumerate()
        .map(|(i, &(kind, header_start, start))| {
            let end = headers
                .get(i + 1)
                .map(|&(_, next_header, _)| next_header)
                .unwrap_or(text.len());
            SectionSpan {
                kind,
                header_start,
                start,
                end: end.max(start),
            }
        })
        .collect()
}

/// Find the span of one section. Absent header yields `None`.
pub fn locate(text: &str, kind: SectionKind) -> Option<SectionSpan> {
    locate_with_config(text, kind, &ParsingConfig::default())
}

/// Config-aware version of [`locate`].
pub(crate) fn locate_with_config(
    text: &str,
    kind: SectionKind,
    config: &ParsingConfig,
) -> Option<SectionSpan> {
    locate_all_with_config(text, config)
        .into_iter()
        .find(|span| span.kind == kind)
}

/// The two labeled halves of a bibliography section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BibliographySplit<'a> {
    pub minimum: Option<&'a str>,
    pub supplementary: Option<&'a str>,
}

static MINIMUM_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)\b(?:m[ií]nima|minimum)[ \t]*:?[ \t]*$").unwrap());
static SUPPLEMENTARY_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)\b(?:complementaria|supplementary)[ \t]*:?[ \t]*$").unwrap()
});

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Split a bibliography section on its "Minimum" / "Supplementary" labels.
pub fn split_bibliography(section: &str) -> BibliographySplit<'_> {
    split_bibliography_with_config(section, &ParsingConfig::default())
}

/// Config-aware version of [`split_bibliography`].
pub(crate) fn split_bibliography_with_config<'a>(
    section: &'a str,
    config: &ParsingConfig,
) -> BibliographySplit<'a> {
    let minimum_re = config.minimum_label_re.as_ref().unwrap_or(&MINIMUM_LABEL_RE);
    let supplementary_re = config
        .supplementary_label_re
        .as_ref()
        .unwrap_or(&SUPPLEMENTARY_LABEL_RE);

    if let Some(min_label) = minimum_re.find(section) {
        let rest = min_label.end();
        return match supplementary_re.find_at(section, rest) {
            Some(sup_label) => BibliographySplit {
                minimum: non_empty(&section[rest..sup_label.start()]),
                supplementary: non_empty(&section[sup_label.end()..]),
            },
            None => BibliographySplit {
                minimum: non_empty(&section[rest..]),
                supplementary: None,
            },
        };
    }

    let sup_label = supplementary_re.find(section);
    let unlabeled = &section[..sup_label.map_or(section.len(), |m| m.start())];
    let supplementary = sup_label.and_then(|m| non_empty(&section[m.end()..]));

    match config.unlabeled_bibliography {
        UnlabeledBibliography::Minimum => {
            tracing::debug!(
                chars = unlabeled.trim().len(),
                "bibliography has no minimum label; treating unlabeled text as minimum"
            );
            BibliographySplit {
                minimum: non_empty(unlabeled),
                supplementary,
            }
        }
        UnlabeledBibliography::Discard => {
            tracing::debug!(
                chars = unlabeled.trim().len(),
                "bibliography has no minimum label; discarding unlabeled text"
            );
            BibliographySplit {
                minimum: None,
                supplementary,
            }
        }
    }
}

/// Isolate the bibliography section: from its header to the first
/// institutional marker, or to the end of the document.
pub fn find_bibliography_section(text: &str) -> Option<&str> {
    find_bibliography_section_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`find_bibliography_section`].
pub(crate) fn find_bibliography_section_with_config<'a>(
    text: &'a str,
    config: &ParsingConfig,
) -> Option<&'a str> {
    locate_with_config(text, SectionKind::Bibliography, config).map(|span| span.slice(text))
}
