//! Document loading from the documents directory.

use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use sha2::{Digest, Sha256};

use crate::core::errors::ApiError;

/// A whole document read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub content: String,
    /// File name, used as the chunk source.
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Text,
    Csv,
}

fn document_kind(path: &Path) -> Option<DocumentKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(DocumentKind::Pdf),
        "txt" | "md" => Some(DocumentKind::Text),
        "csv" => Some(DocumentKind::Csv),
        _ => None,
    }
}

/// Supported files in `dir`, sorted by file name. Creates `dir` if missing.
pub fn supported_files(dir: &Path) -> Result<Vec<PathBuf>, ApiError> {
    fs::create_dir_all(dir).map_err(ApiError::internal)?;

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(ApiError::internal)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && document_kind(path).is_some())
        .collect();
    files.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

pub fn load_documents(dir: &Path) -> Result<Vec<LoadedDocument>, ApiError> {
    let mut documents = Vec::new();

    for path in supported_files(dir)? {
        let source = file_name(&path);
        match load_file(&path) {
            Ok(content) if content.trim().is_empty() => {
                tracing::warn!("Skipping empty document {}", source);
            }
            Ok(content) => {
                tracing::debug!("Loaded {} ({} chars)", source, content.chars().count());
                documents.push(LoadedDocument { content, source });
            }
            Err(err) => {
                tracing::warn!("Failed to load {}: {}", source, err);
            }
        }
    }

    tracing::info!("Loaded {} documents from {}", documents.len(), dir.display());
    Ok(documents)
}

fn load_file(path: &Path) -> anyhow::Result<String> {
    match document_kind(path) {
        Some(DocumentKind::Pdf) => extract_pdf(path),
        Some(DocumentKind::Text) => Ok(fs::read_to_string(path)?),
        Some(DocumentKind::Csv) => render_csv(&fs::read_to_string(path)?),
        None => anyhow::bail!("unsupported file type"),
    }
}

/// pdf-extract panics on some malformed files; those count as load failures.
fn extract_pdf(path: &Path) -> anyhow::Result<String> {
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text(path));
    match result {
        Ok(text) => Ok(text?),
        Err(panic_info) => {
            let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown error".to_string()
            };
            anyhow::bail!("PDF parser panicked: {}", msg)
        }
    }
}

/// Renders CSV as a right-aligned text table with a leading row index column.
pub fn render_csv(content: &str) -> anyhow::Result<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        records.push(record?.iter().map(|s| s.trim().to_string()).collect());
    }
    if records.is_empty() {
        return Ok(String::new());
    }

    let header = records.remove(0);
    let columns = records
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    let mut table: Vec<Vec<String>> = Vec::with_capacity(records.len() + 1);
    let mut head_row = vec![String::new()];
    head_row.extend((0..columns).map(|i| header.get(i).cloned().unwrap_or_default()));
    table.push(head_row);
    for (idx, row) in records.iter().enumerate() {
        let mut line = vec![idx.to_string()];
        line.extend((0..columns).map(|i| row.get(i).cloned().unwrap_or_default()));
        table.push(line);
    }

    let widths: Vec<usize> = (0..=columns)
        .map(|col| {
            table
                .iter()
                .map(|row| row[col].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let lines: Vec<String> = table
        .iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:>width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect();

    Ok(lines.join("\n"))
}

/// SHA-256 over (name, byte length, content) of every supported file in name order.
pub fn corpus_fingerprint(dir: &Path) -> Result<String, ApiError> {
    let mut hasher = Sha256::new();

    for path in supported_files(dir)? {
        let bytes = fs::read(&path).map_err(ApiError::internal)?;
        hasher.update(file_name(&path).as_bytes());
        hasher.update([0u8]);
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_supported_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_dogs.txt"), "Dogs need walks.").unwrap();
        fs::write(dir.path().join("a_cats.md"), "# Cats\nCats purr.").unwrap();
        fs::write(dir.path().join("notes.docx"), "ignored").unwrap();
        fs::write(dir.path().join("empty.txt"), "   ").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["a_cats.md", "b_dogs.txt"]);
        assert_eq!(docs[1].content, "Dogs need walks.");
    }

    #[test]
    fn missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        assert!(load_documents(&data).unwrap().is_empty());
        assert!(data.is_dir());
    }

    #[test]
    fn unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.txt"), [0xffu8, 0xfe, 0x00, 0x80]).unwrap();
        fs::write(dir.path().join("ok.txt"), "Rabbits eat hay.").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "ok.txt");
    }

    #[test]
    fn corrupt_pdf_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a_broken.pdf"),
            b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 9 0 R >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF",
        )
        .unwrap();
        fs::write(dir.path().join("b_not_really.pdf"), "plain text, no header").unwrap();
        fs::write(dir.path().join("c_birds.txt"), "Parrots need grit.").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "c_birds.txt");
    }

    #[test]
    fn csv_files_load_as_rendered_tables() {
        let dir = tempfile::tempdir().unwrap();
        let raw = "clinic,city\nPaws Care,Pune\n";
        fs::write(dir.path().join("clinics.csv"), raw).unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "clinics.csv");
        assert_eq!(docs[0].content, render_csv(raw).unwrap());
        assert!(docs[0].content.lines().nth(1).unwrap().starts_with('0'));
    }

    #[test]
    fn csv_renders_as_aligned_table() {
        let rendered = render_csv("clinic,city\nPaws Care,Pune\nVet One,Goa\n").unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("clinic") && lines[0].contains("city"));
        assert!(lines[1].starts_with('0') && lines[1].contains("Paws Care"));
        assert!(lines[2].starts_with('1') && lines[2].ends_with("Goa"));
        assert_eq!(lines[1].len(), lines[2].len());
    }

    #[test]
    fn fingerprint_tracks_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one").unwrap();
        let first = corpus_fingerprint(dir.path()).unwrap();
        assert_eq!(first, corpus_fingerprint(dir.path()).unwrap());

        fs::write(dir.path().join("a.txt"), "two").unwrap();
        let second = corpus_fingerprint(dir.path()).unwrap();
        assert_ne!(first, second);

        fs::write(dir.path().join("ignored.bin"), "x").unwrap();
        assert_eq!(second, corpus_fingerprint(dir.path()).unwrap());
    }
}
