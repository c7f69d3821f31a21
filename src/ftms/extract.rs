use super::encoding::{decode_detected, decode_ignoring_keep_bom};
use crate::diagnostics::Diagnostics;
use scraper::Html;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The one extension parsed as markup; compared case-insensitively.
const MARKUP_EXTENSION: &str = "html";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extract plain text from the file at `path`.
///
/// `.html` files are decoded with the detected encoding and reduced to their
/// text nodes. Everything else, `.htm` included, is read as UTF-8 with invalid
/// bytes omitted and any BOM kept.
pub fn extract_text(path: &Path, diagnostics: &dyn Diagnostics) -> Result<String, ExtractError> {
    let data = std::fs::read(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if is_markup(path) {
        Ok(html_text(&decode_detected(&data, path, diagnostics)))
    } else {
        Ok(decode_ignoring_keep_bom(encoding_rs::UTF_8, &data))
    }
}

fn is_markup(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(MARKUP_EXTENSION))
        .unwrap_or(false)
}

/// Concatenation of every text node under the document root.
pub fn html_text(html: &str) -> String {
    Html::parse_document(html).root_element().text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn html_tags_are_stripped() {
        let text = html_text("<html><body><p>the <b>cat</b> sat</p></body></html>");
        assert_eq!(text, "the cat sat");
    }

    #[test]
    fn markup_extension_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Index.HTML");
        fs::write(&path, "<p>hello</p>").unwrap();

        let diag = RecordingDiagnostics::new();
        assert_eq!(extract_text(&path, &diag).unwrap(), "hello");
    }

    #[test]
    fn htm_is_read_as_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.htm");
        fs::write(&path, "<b>cat</b>").unwrap();

        let diag = RecordingDiagnostics::new();
        assert_eq!(extract_text(&path, &diag).unwrap(), "<b>cat</b>");
    }

    #[test]
    fn plain_files_keep_leading_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"\xEF\xBB\xBFcat\r\ndog").unwrap();

        let diag = RecordingDiagnostics::new();
        assert_eq!(extract_text(&path, &diag).unwrap(), "\u{FEFF}cat\r\ndog");
    }

    #[test]
    fn latin1_markup_is_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, b"<p>caf\xE9 au lait, tr\xE8s bien, d\xE9j\xE0 vu</p>").unwrap();

        let diag = RecordingDiagnostics::new();
        let text = extract_text(&path, &diag).unwrap();
        assert!(text.starts_with("caf"));
        assert!(text.contains("au lait"));
    }

    #[test]
    fn plain_files_drop_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"cat\xFF cat <b>dog</b>").unwrap();

        let diag = RecordingDiagnostics::new();
        assert_eq!(extract_text(&path, &diag).unwrap(), "cat cat <b>dog</b>");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let diag = RecordingDiagnostics::new();
        let err = extract_text(&dir.path().join("gone.txt"), &diag).unwrap_err();
        assert!(matches!(err, ExtractError::Read { .. }));
    }
}
