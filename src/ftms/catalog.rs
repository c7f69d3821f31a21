use super::extract::extract_text;
use super::index::FileIndex;
use super::schema::{IngestSummary, NewFileRecord};
use crate::diagnostics::Diagnostics;
use anyhow::Result;
use std::path::Path;
use walkdir::WalkDir;

/// Split a file name into stem and extension.
///
/// Leading dots never start an extension, and the extension keeps its dot:
/// `notes.txt` -> (`notes`, `.txt`), `.bashrc` -> (`.bashrc`, `""`).
pub fn split_extension(file_name: &str) -> (&str, &str) {
    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name.rfind('.') {
        Some(dot) if dot > leading_dots => (&file_name[..dot], &file_name[dot..]),
        _ => (file_name, ""),
    }
}

/// Walk `root` and record every non-excluded, readable file in the catalog.
///
/// Only the file's extension is lower-cased before the exclusion check; the
/// entries in `excluded` are compared as given. All inserts share one
/// transaction, committed once the walk finishes.
pub fn ingest(
    index: &FileIndex,
    root: &Path,
    excluded: &[String],
    diagnostics: &dyn Diagnostics,
) -> Result<IngestSummary> {
    let tx = index.begin()?;
    let mut summary = IngestSummary::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let at = e.path().unwrap_or(root);
                diagnostics.error(&format!("Could not walk {}: {e}", at.display()));
                continue;
            }
        };
        // Symlinked directories are listed but not descended into.
        if entry.file_type().is_dir() || entry.path().is_dir() {
            continue;
        }

        let path = entry.path();
        let file = entry.file_name().to_string_lossy();
        let (file_name, file_type) = split_extension(&file);

        let lowered = file_type.to_lowercase();
        if excluded.iter().any(|ext| *ext == lowered) {
            diagnostics.info(&format!("Skipping file due to filter: {}", path.display()));
            summary.filtered += 1;
            continue;
        }

        let content = std::fs::metadata(path)
            .map_err(|e| e.to_string())
            .and_then(|meta| {
                extract_text(path, diagnostics)
                    .map(|text| (meta.len(), text))
                    .map_err(|e| e.to_string())
            });

        let (file_size, content) = match content {
            Ok(found) => found,
            Err(e) => {
                diagnostics.error(&format!("Could not read file {}: {e}", path.display()));
                diagnostics.warn(&format!("Content is None for file: {}", path.display()));
                summary.unreadable += 1;
                continue;
            }
        };

        let record = NewFileRecord {
            file_name: file_name.to_string(),
            full_path: path.to_string_lossy().into_owned(),
            file_type: file_type.to_string(),
            file_size,
            content: Some(content),
        };

        match tx.insert_file(&record) {
            Ok(_) => {
                diagnostics.info(&format!("Inserted file: {}", path.display()));
                summary.inserted += 1;
            }
            Err(e) => {
                diagnostics.error(&format!("Error inserting file {}: {e:#}", path.display()));
                summary.insert_failures += 1;
            }
        }
    }

    tx.commit()?;
    diagnostics.info("Files inserted into 'all_files' table successfully");
    Ok(summary)
}
