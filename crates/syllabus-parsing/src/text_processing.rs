use once_cell::sync::Lazy;
use regex::Regex;

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Map typographic quote and dash variants to their ASCII forms.
pub fn normalize_glyphs(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{00AD}' | '\u{200B}' | '\u{FEFF}'))
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{00B4}' => '\'',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            '\u{00A0}' | '\u{2007}' | '\u{2009}' | '\u{202F}' | '\t' => ' ',
            other => other,
        })
        .collect()
}

/// Normalize a full document text.
///
/// Deterministic and pure:
/// - ligatures expanded, quotes and dashes mapped to ASCII
/// - page-boundary marker lines removed
/// - words split by a line-break hyphen rejoined
/// - runs of spaces collapsed to one, lines trimmed
/// - runs of blank lines collapsed to exactly one, whole text trimmed
pub fn normalize(raw: &str) -> String {
    static PAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?im)^[ \t]*-{3}\s*(?:PAGE|P[AÁ]GINA)\s*(?:\d+|\{\})?\s*-{3}[ \t]*$").unwrap()
    });
    static HYPHEN_BREAK_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(\p{Ll})-[ \t]*\n[ \t]*(\p{Ll})").unwrap());
    static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
    static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = normalize_glyphs(&expand_ligatures(&text));
    let text = PAGE_MARKER_RE.replace_all(&text, "");
    let text = HYPHEN_BREAK_RE.replace_all(&text, "$1$2");
    let text = SPACES_RE.replace_all(&text, " ");

    let trimmed: Vec<&str> = text.lines().map(str::trim).collect();
    let joined = trimmed.join("\n");
    BLANK_LINES_RE.replace_all(&joined, "\n\n").trim().to_string()
}

/// Normalize a single bibliography entry before classification.
///
/// Collapses all whitespace to single spaces and repairs OCR damage where a
/// quote mark was read as `?` around a title.
pub fn normalize_entry(raw: &str) -> String {
    static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    static OCR_OPEN_QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?\s*(\p{Lu})").unwrap());
    static OCR_CLOSE_QUOTE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(\p{Ll})\?\s*,").unwrap());

    let text = normalize_glyphs(&expand_ligatures(raw));
    let text = WS_RE.replace_all(&text, " ");
    let text = text.trim();
    let text = OCR_OPEN_QUOTE_RE.replace_all(text, "\"$1");
    OCR_CLOSE_QUOTE_RE.replace_all(&text, "$1\",").into_owned()
}

/// Collapse every whitespace run (newlines included) to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(expand_ligatures("ﬁnding ﬂow"), "finding flow");
        assert_eq!(expand_ligatures("eﬃcient oﬄine"), "efficient offline");
        assert_eq!(expand_ligatures("no ligatures here"), "no ligatures here");
    }

    #[test]
    fn test_normalize_glyphs() {
        assert_eq!(
            normalize_glyphs("\u{201C}Título\u{201D} \u{2013} l\u{2019}art"),
            "\"Título\" - l'art"
        );
    }

    #[test]
    fn test_normalize_collapses_blank_lines_and_spaces() {
        let raw = "  SIGLA :   IIC2233 \n\n\n\nCURSO:  Programación\n";
        assert_eq!(normalize(raw), "SIGLA : IIC2233\n\nCURSO: Programación");
    }

    #[test]
    fn test_normalize_strips_page_markers() {
        let raw = "primera página\n--- PAGE 1 ---\nsegunda\n--- PÁGINA 2 ---\ntercera";
        let out = normalize(raw);
        assert!(!out.contains("PAGE"));
        assert!(!out.contains("PÁGINA"));
        assert_eq!(out, "primera página\n\nsegunda\n\ntercera");
    }

    #[test]
    fn test_normalize_joins_line_break_hyphen() {
        assert_eq!(normalize("aprendi-\nzaje profundo"), "aprendizaje profundo");
        // A hyphen before a capital is kept as a line.
        assert_eq!(normalize("Auto-\nEncoder"), "Auto-\nEncoder");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "I. DESCRIPCIÓN DEL CURSO\n\n\n  Texto   con\u{00A0}espacios \u{2014} y guiones.";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalize_entry_ocr_quotes() {
        assert_eq!(
            normalize_entry("Smith, J., ?Deep Learning Basics?, MIT Press, 2019."),
            "Smith, J., \"Deep Learning Basics\", MIT Press, 2019."
        );
    }

    #[test]
    fn test_normalize_entry_whitespace() {
        assert_eq!(
            normalize_entry("  Hastie, T.\n  The Elements of\tStatistical Learning. "),
            "Hastie, T. The Elements of Statistical Learning."
        );
    }
}
