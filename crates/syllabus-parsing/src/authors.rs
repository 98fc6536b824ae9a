use once_cell::sync::Lazy;
use regex::Regex;

/// Default cap on parsed authors per reference.
pub const DEFAULT_MAX_AUTHORS: usize = 5;
/// Cap on authors recovered by [`extract_basic_authors`].
pub const BASIC_MAX_AUTHORS: usize = 3;
/// Number of leading words [`extract_basic_authors`] looks at.
const BASIC_SCAN_WORDS: usize = 10;

/// Parse an author string into individual names.
pub fn parse_authors(authors: &str) -> Vec<String> {
    parse_authors_with_max(authors, DEFAULT_MAX_AUTHORS)
}

/// Split `text` on every comma whose next non-space character is uppercase.
fn split_comma_before_capital(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(',') {
        let after = text[idx + 1..].trim_start();
        if after.chars().next().is_some_and(char::is_uppercase) {
            parts.push(&text[start..idx]);
            start = idx + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parse an author string, keeping at most `max_authors` names.
///
/// Separators are applied as cumulative passes: ` and ` / ` y `, a comma
/// followed by a capital, `;`, and `&`. Honorifics and parenthesized years
/// are removed; fragments of two characters or less, and pure numbers, are
/// dropped.
pub(crate) fn parse_authors_with_max(authors: &str, max_authors: usize) -> Vec<String> {
    static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(?:and|y)\s+").unwrap());
    static SEMICOLON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*;\s*").unwrap());
    static AMP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*&\s*").unwrap());
    static YEAR_TAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\d{4}\).*").unwrap());
    static HONORIFIC_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(?:Mrs|Prof|Dr|Mr|Ms)(?:\.\s*|\s+)").unwrap());
    static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

    let authors = authors.trim_matches(|c: char| " .,;".contains(c));
    if authors.is_empty() {
        return Vec::new();
    }

    let mut parts: Vec<&str> = AND_RE.split(authors).collect();
    parts = parts
        .into_iter()
        .flat_map(split_comma_before_capital)
        .collect();
    parts = parts.into_iter().flat_map(|p| SEMICOLON_RE.split(p)).collect();
    parts = parts.into_iter().flat_map(|p| AMP_RE.split(p)).collect();

    parts
        .into_iter()
        .map(|p| p.trim_matches(|c: char| " .,;()".contains(c)))
        .filter(|p| p.chars().count() > 2 && !DIGITS_RE.is_match(p))
        .map(|p| {
            let p = YEAR_TAIL_RE.replace(p, "");
            HONORIFIC_RE.replace(&p, "").trim().to_string()
        })
        .filter(|p| !p.is_empty())
        .take(max_authors)
        .collect()
}

/// Best-effort author scan over the first words of an entry.
///
/// A capitalized surname (optionally followed by a comma) opens a new
/// author; initials and short capitalized words extend the current one.
/// The scan stops at the first word that fits neither.
pub fn extract_basic_authors(text: &str) -> Vec<String> {
    static SURNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}\p{Ll}+,?$").unwrap());
    static INITIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}\.?$").unwrap());

    let mut authors = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace().take(BASIC_SCAN_WORDS) {
        if SURNAME_RE.is_match(word) {
            if !current.is_empty() {
                authors.push(current.join(" "));
            }
            current = vec![word.trim_end_matches(',')];
        } else if INITIAL_RE.is_match(word)
            || (word.chars().next().is_some_and(char::is_uppercase) && word.chars().count() < 15)
        {
            current.push(word);
        } else {
            break;
        }
    }
    if !current.is_empty() {
        authors.push(current.join(" "));
    }

    authors.truncate(BASIC_MAX_AUTHORS);
    authors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and() {
        assert_eq!(
            parse_authors("Goodfellow and Bengio and Courville"),
            vec!["Goodfellow", "Bengio", "Courville"]
        );
    }

    #[test]
    fn test_comma_before_capital() {
        // Initials split off and are dropped as too short.
        assert_eq!(parse_authors("Smith, J."), vec!["Smith"]);
        assert_eq!(
            parse_authors("Hastie, Tibshirani, Friedman"),
            vec!["Hastie", "Tibshirani", "Friedman"]
        );
    }

    #[test]
    fn test_semicolon_and_ampersand() {
        assert_eq!(
            parse_authors("Russell Stuart; Norvig Peter & Davis Ernest"),
            vec!["Russell Stuart", "Norvig Peter", "Davis Ernest"]
        );
    }

    #[test]
    fn test_spanish_conjunction() {
        assert_eq!(
            parse_authors("Pérez Gómez y Soto Ruiz"),
            vec!["Pérez Gómez", "Soto Ruiz"]
        );
    }

    #[test]
    fn test_honorifics_removed() {
        assert_eq!(
            parse_authors("Dr. Alan Turing; Prof. Grace Hopper"),
            vec!["Alan Turing", "Grace Hopper"]
        );
        // A surname that merely starts like an honorific stays intact.
        assert_eq!(parse_authors("Drake Miller"), vec!["Drake Miller"]);
    }

    #[test]
    fn test_digits_and_short_fragments_dropped() {
        assert_eq!(parse_authors("Knuth; 1997; Al"), vec!["Knuth"]);
    }

    #[test]
    fn test_year_tail_removed() {
        assert_eq!(parse_authors("Mitchell Tom (1997) Machine"), vec!["Mitchell Tom"]);
    }

    #[test]
    fn test_cap_at_five() {
        let authors = parse_authors("Aaa; Bbb; Ccc; Ddd; Eee; Fff; Ggg");
        assert_eq!(authors.len(), 5);
        assert_eq!(authors[4], "Eee");
        assert_eq!(parse_authors_with_max("Aaa; Bbb; Ccc", 2).len(), 2);
    }

    #[test]
    fn test_empty() {
        assert!(parse_authors("").is_empty());
        assert!(parse_authors(" ., ;").is_empty());
    }

    #[test]
    fn test_basic_authors() {
        assert_eq!(
            extract_basic_authors("Smith, J. Deep learning basics, 2019"),
            vec!["Smith J.", "Deep"]
        );
        assert_eq!(
            extract_basic_authors("Russell, S. Norvig, P. artificial intelligence"),
            vec!["Russell S.", "Norvig P."]
        );
        assert!(extract_basic_authors("lowercase start here").is_empty());
    }

    #[test]
    fn test_basic_authors_cap() {
        let authors = extract_basic_authors("Aab, Bbc, Ccd, Dde, Eef,");
        assert_eq!(authors, vec!["Aab", "Bbc", "Ccd"]);
    }
}
