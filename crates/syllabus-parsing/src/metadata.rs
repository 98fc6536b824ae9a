use once_cell::sync::Lazy;
use regex::Regex;

use syllabus_core::{CourseMetadata, InstitutionalInfo};

/// How a labeled value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// First alphanumeric run, e.g. a course code.
    Code,
    /// Trimmed free text.
    Text,
    /// First run of digits.
    Number,
    /// Comma-separated list.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Code,
    Name,
    Translation,
    Credits,
    Modules,
    Character,
    Types,
    Grading,
    Discipline,
    Keywords,
    Level,
}

impl Field {
    fn name(&self) -> &'static str {
        match self {
            Field::Code => "code",
            Field::Name => "name",
            Field::Translation => "translation",
            Field::Credits => "credits",
            Field::Modules => "modules",
            Field::Character => "character",
            Field::Types => "types",
            Field::Grading => "grading",
            Field::Discipline => "discipline",
            Field::Keywords => "keywords",
            Field::Level => "level",
        }
    }
}

/// (field, label pattern, kind). Labels are accent-optional.
const FIELD_TABLE: &[(Field, &str, FieldKind)] = &[
    (Field::Code, r"SIGLA", FieldKind::Code),
    (Field::Name, r"CURSO", FieldKind::Text),
    (Field::Translation, r"TRADUCCI[OÓ]N", FieldKind::Text),
    (Field::Credits, r"CR[EÉ]DITOS", FieldKind::Number),
    (Field::Modules, r"M[OÓ]DULOS", FieldKind::Number),
    (Field::Character, r"CAR[AÁ]CTER", FieldKind::Text),
    (Field::Types, r"TIPO", FieldKind::List),
    (Field::Grading, r"CALIFICACI[OÓ]N", FieldKind::Text),
    (Field::Discipline, r"DISCIPLINA", FieldKind::Text),
    (Field::Keywords, r"PALABRAS\s+CLAVE", FieldKind::List),
    (Field::Level, r"NIVEL\s+FORMATIVO", FieldKind::Text),
];

static FIELD_PATTERNS: Lazy<Vec<(Field, Regex, FieldKind)>> = Lazy::new(|| {
    FIELD_TABLE
        .iter()
        .map(|&(field, label, kind)| {
            let re = Regex::new(&format!(r"(?i)\b{label}\s*:\s*([^\n]+)")).unwrap();
            (field, re, kind)
        })
        .collect()
});

enum Value {
    Text(String),
    Number(u32),
    List(Vec<String>),
}

fn interpret(field: Field, kind: FieldKind, raw: &str) -> Option<Value> {
    static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());
    static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

    let raw = raw.trim();
    match kind {
        FieldKind::Code => CODE_RE.find(raw).map(|m| Value::Text(m.as_str().to_string())),
        FieldKind::Text => (!raw.is_empty()).then(|| Value::Text(raw.to_string())),
        FieldKind::Number => {
            let Some(digits) = DIGITS_RE.find(raw) else {
                tracing::warn!(field = field.name(), value = raw, "numeric field has no digits");
                return None;
            };
            match digits.as_str().parse::<u32>() {
                Ok(n) => Some(Value::Number(n)),
                Err(e) => {
                    tracing::warn!(field = field.name(), value = raw, error = %e, "numeric field out of range");
                    None
                }
            }
        }
        FieldKind::List => {
            let items: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            (!items.is_empty()).then_some(Value::List(items))
        }
    }
}

fn assign(metadata: &mut CourseMetadata, field: Field, value: Value) {
    match (field, value) {
        (Field::Code, Value::Text(v)) => metadata.code = Some(v),
        (Field::Name, Value::Text(v)) => metadata.name = Some(v),
        (Field::Translation, Value::Text(v)) => metadata.translation = Some(v),
        (Field::Character, Value::Text(v)) => metadata.character = Some(v),
        (Field::Grading, Value::Text(v)) => metadata.grading = Some(v),
        (Field::Discipline, Value::Text(v)) => metadata.discipline = Some(v),
        (Field::Level, Value::Text(v)) => metadata.level = Some(v),
        (Field::Credits, Value::Number(n)) => metadata.credits = Some(n),
        (Field::Modules, Value::Number(n)) => metadata.modules = Some(n),
        (Field::Types, Value::List(v)) => metadata.types = v,
        (Field::Keywords, Value::List(v)) => metadata.keywords = v,
        (field, _) => {
            tracing::warn!(field = field.name(), "value kind does not fit field; skipped")
        }
    }
}

/// Apply the labeled-field table to `text`.
///
/// Each field takes the first `LABEL : value` occurrence, value running to
/// the end of the line. Unmatched labels leave the field unset.
pub fn extract_metadata(text: &str) -> CourseMetadata {
    let mut metadata = CourseMetadata::default();
    for (field, re, kind) in FIELD_PATTERNS.iter() {
        let Some(caps) = re.captures(text) else {
            tracing::debug!(field = field.name(), "metadata label not found");
            continue;
        };
        if let Some(value) = interpret(*field, *kind, &caps[1]) {
            assign(&mut metadata, *field, value);
        }
    }
    metadata
}

/// Read the institutional tail: issuing university, faculty, school,
/// institute and the month-year date stamp.
///
/// The first line matching each kind wins.
pub fn extract_institutional(text: &str) -> InstitutionalInfo {
    static UNIVERSITY_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(?:PONTIFICIA\s+)?UNIVERSIDAD\b").unwrap());
    static FACULTY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^FACULTAD\s+DE\b").unwrap());
    static SCHOOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^ESCUELA\s+DE\b").unwrap());
    static INSTITUTE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^INSTITUTO\s+DE\b").unwrap());
    static DATE_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)\b(?:ENERO|FEBRERO|MARZO|ABRIL|MAYO|JUNIO|JULIO|AGOSTO|SEPTIEMBRE|SETIEMBRE|OCTUBRE|NOVIEMBRE|DICIEMBRE)\s+(?:DE\s+|DEL\s+)?(?:19|20)\d{2}\b",
        )
        .unwrap()
    });

    let mut info = InstitutionalInfo::default();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let slot = if UNIVERSITY_RE.is_match(line) {
            &mut info.university
        } else if FACULTY_RE.is_match(line) {
            &mut info.faculty
        } else if SCHOOL_RE.is_match(line) {
            &mut info.school
        } else if INSTITUTE_RE.is_match(line) {
            &mut info.institute
        } else if let Some(m) = DATE_RE.find(line) {
            if info.date.is_none() {
                info.date = Some(m.as_str().to_string());
            }
            continue;
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = Some(line.to_string());
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "SIGLA : IIC2233\n\
        CURSO : Programación Avanzada\n\
        TRADUCCIÓN : Advanced Programming\n\
        CRÉDITOS : 10 UC\n\
        MÓDULOS : 03\n\
        CARÁCTER : Mínimo\n\
        TIPO : Cátedra, Laboratorio\n\
        CALIFICACIÓN : Estándar\n\
        DISCIPLINA : Ciencia de la Computación\n\
        PALABRAS CLAVE : Programación, Python , Objetos,\n\
        NIVEL FORMATIVO : Pregrado\n";

    #[test]
    fn test_extract_all_fields() {
        let m = extract_metadata(HEADER);
        assert_eq!(m.code.as_deref(), Some("IIC2233"));
        assert_eq!(m.name.as_deref(), Some("Programación Avanzada"));
        assert_eq!(m.translation.as_deref(), Some("Advanced Programming"));
        assert_eq!(m.credits, Some(10));
        assert_eq!(m.modules, Some(3));
        assert_eq!(m.character.as_deref(), Some("Mínimo"));
        assert_eq!(m.types, vec!["Cátedra", "Laboratorio"]);
        assert_eq!(m.grading.as_deref(), Some("Estándar"));
        assert_eq!(m.discipline.as_deref(), Some("Ciencia de la Computación"));
        assert_eq!(m.keywords, vec!["Programación", "Python", "Objetos"]);
        assert_eq!(m.level.as_deref(), Some("Pregrado"));
    }

    #[test]
    fn test_unaccented_labels() {
        let m = extract_metadata("CREDITOS: 5\nMODULOS: 2\nTRADUCCION: Calculus");
        assert_eq!(m.credits, Some(5));
        assert_eq!(m.modules, Some(2));
        assert_eq!(m.translation.as_deref(), Some("Calculus"));
    }

    #[test]
    fn test_missing_fields_unset() {
        let m = extract_metadata("SIGLA: MAT1610\nTexto sin más etiquetas.");
        assert_eq!(m.code.as_deref(), Some("MAT1610"));
        assert!(m.name.is_none());
        assert!(m.credits.is_none());
        assert!(m.types.is_empty());
    }

    #[test]
    fn test_number_without_digits_is_skipped() {
        let m = extract_metadata("CRÉDITOS : diez\nCURSO : Cálculo I");
        assert!(m.credits.is_none());
        assert_eq!(m.name.as_deref(), Some("Cálculo I"));
    }

    #[test]
    fn test_code_takes_first_token() {
        let m = extract_metadata("SIGLA : ICS3413 (sección 1)");
        assert_eq!(m.code.as_deref(), Some("ICS3413"));
    }

    #[test]
    fn test_extract_institutional() {
        let tail = "PONTIFICIA UNIVERSIDAD CATÓLICA DE CHILE\n\
            FACULTAD DE INGENIERÍA\n\
            ESCUELA DE INGENIERÍA\n\
            INSTITUTO DE MATEMÁTICAS\n\
            Marzo 2024\n";
        let info = extract_institutional(tail);
        assert_eq!(
            info.university.as_deref(),
            Some("PONTIFICIA UNIVERSIDAD CATÓLICA DE CHILE")
        );
        assert_eq!(info.faculty.as_deref(), Some("FACULTAD DE INGENIERÍA"));
        assert_eq!(info.school.as_deref(), Some("ESCUELA DE INGENIERÍA"));
        assert_eq!(info.institute.as_deref(), Some("INSTITUTO DE MATEMÁTICAS"));
        assert_eq!(info.date.as_deref(), Some("Marzo 2024"));
    }

    #[test]
    fn test_institutional_empty() {
        assert!(extract_institutional("nada relevante aquí").is_empty());
    }
}
