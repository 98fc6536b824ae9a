use once_cell::sync::Lazy;
use regex::Regex;

use syllabus_core::{ContentOutline, EvaluationScheme};

use crate::config::ParsingConfig;
use crate::text_processing::collapse_whitespace;

/// Course description: the section body on one line.
pub fn extract_description(section: &str) -> Option<String> {
    let description = collapse_whitespace(section);
    (!description.is_empty()).then_some(description)
}

/// Learning outcomes: each block opens with `N.` and absorbs the wrapped
/// lines that follow it. Text before the first numbered line is an
/// introduction and is skipped.
pub fn extract_outcomes(section: &str) -> Vec<String> {
    static OUTCOME_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").unwrap());

    let mut outcomes = Vec::new();
    let mut current: Option<String> = None;

    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = OUTCOME_START_RE.captures(line) {
            if let Some(done) = current.take() {
                outcomes.push(collapse_whitespace(&done));
            }
            current = Some(caps[1].to_string());
        } else if let Some(buf) = current.as_mut() {
            buf.push(' ');
            buf.push_str(line);
        }
    }
    if let Some(done) = current {
        outcomes.push(collapse_whitespace(&done));
    }
    outcomes.retain(|o| !o.is_empty());
    outcomes
}

/// Content outline tree from `N.`, `N.N.` and `N.N.N.` lines.
///
/// A numbered line whose parent number has not been seen is dropped along
/// with the body lines that follow it. Other lines are appended to the body
/// of the last accepted node.
pub fn extract_outline(section: &str) -> ContentOutline {
    static DEPTH3_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d+\.\d+\.\d+)\.?\s+(.+)$").unwrap());
    static DEPTH2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.\d+)\.?\s+(.+)$").unwrap());
    static DEPTH1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").unwrap());

    let mut outline = ContentOutline::new();
    let mut last: Option<String> = None;

    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let numbered = DEPTH3_RE
            .captures(line)
            .or_else(|| DEPTH2_RE.captures(line))
            .or_else(|| DEPTH1_RE.captures(line));

        match numbered {
            Some(caps) => {
                let number = &caps[1];
                let title = caps[2].trim();
                if outline.insert(number, title) {
                    last = Some(number.to_string());
                } else {
                    tracing::debug!(number, title, "outline item has no parent; dropped");
                    last = None;
                }
            }
            None => {
                if let Some(number) = &last {
                    outline.append_body(number, line);
                }
            }
        }
    }
    outline
}

static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s\-•*·▪●◦]+").unwrap());

/// Methodology lines with their bullets stripped.
pub fn extract_methodology(section: &str) -> Vec<String> {
    extract_methodology_with_config(section, &ParsingConfig::default())
}

/// Config-aware version of [`extract_methodology`].
pub(crate) fn extract_methodology_with_config(section: &str, config: &ParsingConfig) -> Vec<String> {
    section
        .lines()
        .map(|line| BULLET_RE.replace(line, "").trim().to_string())
        .filter(|line| line.chars().count() >= config.min_methodology_chars)
        .collect()
}

/// Evaluation items of the form `label : NN%`, optionally bulleted.
pub fn extract_evaluation(section: &str) -> EvaluationScheme {
    extract_evaluation_with_config(section, &ParsingConfig::default())
}

/// Config-aware version of [`extract_evaluation`].
pub(crate) fn extract_evaluation_with_config(
    section: &str,
    config: &ParsingConfig,
) -> EvaluationScheme {
    static ITEM_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^\s*(?:[-•*·▪●◦]\s*)?(.+?)\s*:\s*(\d+(?:[.,]\d+)?)\s*%").unwrap()
    });

    let mut scheme = EvaluationScheme::with_tolerance(config.sum_tolerance);
    for line in section.lines() {
        let Some(caps) = ITEM_RE.captures(line) else {
            continue;
        };
        let label = caps[1].trim();
        match caps[2].replace(',', ".").parse::<f64>() {
            Ok(weight) => scheme.insert(label, weight),
            Err(e) => tracing::warn!(label, value = &caps[2], error = %e, "unreadable evaluation weight"),
        }
    }
    if !scheme.is_empty() && !scheme.sums_to_100() {
        tracing::debug!(total = scheme.total(), "evaluation weights do not sum to 100");
    }
    scheme
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_collapsed() {
        assert_eq!(
            extract_description("\nEste curso   introduce\nlos fundamentos.\n\n"),
            Some("Este curso introduce los fundamentos.".to_string())
        );
        assert_eq!(extract_description(" \n "), None);
    }

    #[test]
    fn test_outcomes_with_wrapped_lines() {
        let section = "Al finalizar el curso el estudiante será capaz de:\n\
            1. Diseñar programas\norientados a objetos.\n\
            2. Analizar la complejidad de algoritmos.\n\
            3. Aplicar estructuras\n  de datos\nadecuadas.";
        let outcomes = extract_outcomes(section);
        assert_eq!(
            outcomes,
            vec![
                "Diseñar programas orientados a objetos.",
                "Analizar la complejidad de algoritmos.",
                "Aplicar estructuras de datos adecuadas.",
            ]
        );
    }

    #[test]
    fn test_outcomes_missing_section() {
        assert!(extract_outcomes("").is_empty());
        assert!(extract_outcomes("Sin numeración alguna.").is_empty());
    }

    #[test]
    fn test_outline_tree() {
        let section = "1. Introducción\n\
            1.1. Historia de la computación\n\
            1.2 Arquitectura\n\
            1.2.1. Memoria\n\
            con un párrafo que sigue\n\
            2. Algoritmos\n\
            2.1. Ordenamiento";
        let outline = extract_outline(section);
        assert_eq!(outline.len(), 6);
        let roots: Vec<_> = outline.roots().map(|n| n.title.as_str()).collect();
        assert_eq!(roots, vec!["Introducción", "Algoritmos"]);
        let children: Vec<_> = outline.children("1").map(|n| n.number.as_str()).collect();
        assert_eq!(children, vec!["1.1", "1.2"]);
        let memory = outline.get("1.2.1").unwrap();
        assert_eq!(memory.title, "Memoria");
        assert_eq!(memory.body.as_deref(), Some("con un párrafo que sigue"));
    }

    #[test]
    fn test_outline_orphan_dropped() {
        let section = "2. Modelos\n2.1.1 Huérfano\ntexto del huérfano\n2.2. Redes";
        let outline = extract_outline(section);
        assert!(!outline.contains("2.1.1"));
        assert!(outline.walk().iter().all(|n| n.title != "Huérfano"));
        assert_eq!(outline.get("2").and_then(|n| n.body.as_deref()), None);
        assert!(outline.contains("2.2"));
    }

    #[test]
    fn test_methodology_strips_bullets() {
        let section = "- Clases expositivas\n• Laboratorios prácticos\n* Tareas\n-\n  ok\n\n· Proyecto semestral";
        assert_eq!(
            extract_methodology(section),
            vec![
                "Clases expositivas",
                "Laboratorios prácticos",
                "Tareas",
                "Proyecto semestral"
            ]
        );
    }

    #[test]
    fn test_evaluation_sums_to_100() {
        let section = "- Tareas: 30%\n- Interrogaciones : 30 %\n• Examen: 40%";
        let scheme = extract_evaluation(section);
        assert_eq!(scheme.len(), 3);
        assert_eq!(scheme.get("Interrogaciones"), Some(30.0));
        assert!(scheme.sums_to_100());
    }

    #[test]
    fn test_evaluation_not_100() {
        let scheme = extract_evaluation("Tareas: 30%\nControles: 30%\nExamen: 30%");
        assert!(!scheme.sums_to_100());
    }

    #[test]
    fn test_evaluation_decimal_comma_and_repeat() {
        let scheme = extract_evaluation("Quiz: 12,5%\nTareas: 20%\nQuiz: 30%\nExamen: 50%");
        assert_eq!(scheme.get("Quiz"), Some(30.0));
        assert_eq!(scheme.items()[0].label, "Quiz");
        assert!(scheme.sums_to_100());
    }
}
