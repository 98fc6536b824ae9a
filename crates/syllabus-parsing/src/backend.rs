use std::path::Path;

use syllabus_core::{BackendError, TextBackend};

/// Reads text that was already extracted to disk (`.txt` dumps).
///
/// Invalid UTF-8 is replaced rather than rejected, since OCR dumps often
/// carry a few stray bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextBackend;

impl PlainTextBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TextBackend for PlainTextBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let bytes = std::fs::read(path)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), "text dump is not valid UTF-8; replacing bad bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        if text.trim().is_empty() {
            return Err(BackendError::EmptyText);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_text_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SIGLA : IIC1001").unwrap();
        let text = PlainTextBackend.extract_text(file.path()).unwrap();
        assert_eq!(text.trim(), "SIGLA : IIC1001");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"CURSO : C\xE1lculo\n").unwrap();
        let text = PlainTextBackend.extract_text(file.path()).unwrap();
        assert!(text.starts_with("CURSO : C"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_empty_file_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            PlainTextBackend.extract_text(file.path()),
            Err(BackendError::EmptyText)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PlainTextBackend
            .extract_text(Path::new("/definitely/not/here.txt"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }
}
