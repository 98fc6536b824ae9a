use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;

/// Does `line` begin a new reference, given the entry accumulated so far?
///
/// A line opens an entry when it is the first line, when it starts with an
/// author-like prefix (`Surname,` or `Surname, I.`), or when the buffer
/// already looks complete: it ends in sentence-terminal punctuation or a
/// four-digit year.
fn is_entry_start(line: &str, buffer: &str) -> bool {
    static AUTHOR_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}\p{Ll}+,").unwrap());
    static COMPLETE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?:[.!?]|\b\d{4})\s*$").unwrap());

    buffer.is_empty() || AUTHOR_PREFIX_RE.is_match(line) || COMPLETE_RE.is_match(buffer)
}

/// Segment free-flowing bibliography text into individual reference strings.
///
/// Single greedy pass over the non-empty lines; continuation lines are
/// joined with one space. Segments shorter than the minimum entry length
/// are discarded.
pub fn segment_entries(text: &str) -> Vec<String> {
    segment_entries_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`segment_entries`].
pub(crate) fn segment_entries_with_config(text: &str, config: &ParsingConfig) -> Vec<String> {
    let mut entries = Vec::new();
    let mut buffer = String::new();

    let mut flush = |buffer: &mut String| {
        let entry = std::mem::take(buffer);
        if entry.chars().count() >= config.min_entry_chars {
            entries.push(entry);
        } else if !entry.is_empty() {
            tracing::debug!(entry = %entry, "bibliography fragment below minimum length; dropped");
        }
    };

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_entry_start(line, &buffer) {
            flush(&mut buffer);
            buffer.push_str(line);
        } else {
            buffer.push(' ');
            buffer.push_str(line);
        }
    }
    flush(&mut buffer);

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_prefix_starts_entry() {
        let text = "Hastie, T., Tibshirani, R. The Elements of\n\
            Statistical Learning\n\
            Bishop, C. Pattern Recognition and Machine Learning";
        let entries = segment_entries(text);
        assert_eq!(
            entries,
            vec![
                "Hastie, T., Tibshirani, R. The Elements of Statistical Learning",
                "Bishop, C. Pattern Recognition and Machine Learning",
            ]
        );
    }

    #[test]
    fn test_terminal_punctuation_starts_entry() {
        let text = "Sedgewick R. Algorithms. Addison-Wesley.\n\
            Knuth D. The Art of Computer Programming\n\
            Volume 1";
        let entries = segment_entries(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], "Knuth D. The Art of Computer Programming Volume 1");
    }

    #[test]
    fn test_trailing_year_starts_entry() {
        let text = "Cormen T. Introduction to Algorithms, MIT Press, 2009\n\
            another reference without capital author, 2011";
        let entries = segment_entries(text);
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_short_fragment_yields_nothing() {
        assert!(segment_entries("Ibid.").is_empty());
        assert!(segment_entries("").is_empty());
    }

    #[test]
    fn test_short_fragment_between_entries_dropped() {
        let text = "Smith, J. Some long enough title. 2019.\npp. 3.\nJones, A. Another book. 2020.";
        let entries = segment_entries(text);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.len() >= 10));
    }

    #[test]
    fn test_accented_surname_prefix() {
        let text = "Núñez, P. Estadística aplicada\nÁlvarez, R. Cálculo en varias variables";
        assert_eq!(segment_entries(text).len(), 2);
    }
}
