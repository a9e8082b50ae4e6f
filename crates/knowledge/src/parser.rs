//! Source document loading and text normalization.

use crate::types::PageText;
use resume_core::{AppError, AppResult};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Page separator emitted by `pdftotext` and similar extractors.
pub const PAGE_SEPARATOR: char = '\x0c';

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts per-page text from a source file.
pub trait DocumentLoader: Send + Sync {
    /// Loader name for logs.
    fn name(&self) -> &str;

    /// Load the pages of `path` in order.
    ///
    /// Fails with `NotFound` when the file does not exist.
    fn load_pages(&self, path: &Path) -> AppResult<Vec<PageText>>;
}

/// Loader for UTF-8 text files.
///
/// Form-feed characters split the text into pages; a file without any is a
/// single page-less document. Invalid UTF-8 is decoded lossily, but PDFs
/// and files containing NUL bytes are rejected as binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextLoader;

impl DocumentLoader for PlainTextLoader {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn load_pages(&self, path: &Path) -> AppResult<Vec<PageText>> {
        if !path.exists() {
            return Err(AppError::NotFound(path.display().to_string()));
        }

        let bytes = fs::read(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;
        if bytes.starts_with(PDF_MAGIC) || bytes.contains(&0) {
            return Err(AppError::Knowledge(format!(
                "{:?} is a binary file, not text",
                path
            )));
        }
        let raw = String::from_utf8_lossy(&bytes);

        if !raw.contains(PAGE_SEPARATOR) {
            return Ok(vec![PageText {
                page: None,
                text: raw.into_owned(),
            }]);
        }

        let mut pages: Vec<PageText> = raw
            .split(PAGE_SEPARATOR)
            .enumerate()
            .map(|(i, text)| PageText {
                page: Some(i as u32),
                text: text.to_string(),
            })
            .collect();

        // A trailing form feed terminates the last page rather than opening one
        if pages.last().map(|p| p.text.trim().is_empty()).unwrap_or(false) {
            pages.pop();
        }

        Ok(pages)
    }
}

/// Loader for PDF files.
///
/// Text is extracted page by page with zero-based page numbers. A page whose
/// text cannot be extracted (scanned images, unsupported fonts) comes back
/// empty, so a document without any text fails ingestion with
/// `EmptyDocument`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn name(&self) -> &str {
        "pdf"
    }

    fn load_pages(&self, path: &Path) -> AppResult<Vec<PageText>> {
        if !path.exists() {
            return Err(AppError::NotFound(path.display().to_string()));
        }

        let bytes = fs::read(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;
        let document = lopdf::Document::load_mem(&bytes)
            .map_err(|e| AppError::Knowledge(format!("Failed to parse PDF {:?}: {}", path, e)))?;

        let pages = document
            .get_pages()
            .into_keys()
            .map(|number| {
                let text = document.extract_text(&[number]).unwrap_or_else(|e| {
                    tracing::warn!("No text extracted from page {} of {:?}: {}", number, path, e);
                    String::new()
                });
                PageText {
                    page: Some(number.saturating_sub(1)),
                    text,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!("Extracted {} page(s) from {:?}", pages.len(), path);
        Ok(pages)
    }
}

/// Pick the loader for a source file.
///
/// PDFs are recognized by a `.pdf` extension or by their magic bytes;
/// everything else is read as text.
pub fn loader_for_path(path: &Path) -> Arc<dyn DocumentLoader> {
    if is_pdf(path) {
        Arc::new(PdfLoader)
    } else {
        Arc::new(PlainTextLoader)
    }
}

fn is_pdf(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if by_extension {
        return true;
    }

    let mut head = [0u8; 5];
    fs::File::open(path)
        .and_then(|mut file| file.read_exact(&mut head))
        .map(|_| head == PDF_MAGIC)
        .unwrap_or(false)
}

/// Collapse every whitespace run, newlines included, to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::support::pdf_bytes;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Senior\tEngineer\n\nAcme   Corp \r\n"),
            "Senior Engineer Acme Corp"
        );
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_single_document_has_no_page() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("resume.txt");
        fs::write(&path, "Jane Doe\nEngineer").unwrap();

        let pages = PlainTextLoader.load_pages(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page, None);
    }

    #[test]
    fn test_form_feed_splits_pages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("resume.txt");
        fs::write(&path, "Page one\x0cPage two\x0c").unwrap();

        let pages = PlainTextLoader.load_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, Some(0));
        assert_eq!(pages[1].page, Some(1));
        assert_eq!(pages[1].text, "Page two");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("resume.txt");
        fs::write(&path, [b'o', b'k', 0xff, b'!']).unwrap();

        let pages = PlainTextLoader.load_pages(&path).unwrap();
        assert!(pages[0].text.starts_with("ok"));
        assert!(pages[0].text.ends_with('!'));
    }

    #[test]
    fn test_plain_text_rejects_binary() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("resume.txt");
        fs::write(&pdf, b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\n%%EOF").unwrap();
        let blob = temp.path().join("resume.bin");
        fs::write(&blob, [b'a', 0, b'b']).unwrap();

        assert!(matches!(
            PlainTextLoader.load_pages(&pdf),
            Err(AppError::Knowledge(_))
        ));
        assert!(matches!(
            PlainTextLoader.load_pages(&blob),
            Err(AppError::Knowledge(_))
        ));
    }

    #[test]
    fn test_pdf_pages_are_extracted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("resume.pdf");
        fs::write(
            &path,
            pdf_bytes(&["Jane Doe Senior Rust Engineer", "Education BSc Computer Science"]),
        )
        .unwrap();

        let pages = PdfLoader.load_pages(&path).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, Some(0));
        assert_eq!(pages[1].page, Some(1));
        assert!(normalize_whitespace(&pages[0].text).contains("Senior Rust Engineer"));
        assert!(normalize_whitespace(&pages[1].text).contains("Computer Science"));
    }

    #[test]
    fn test_pdf_parse_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("resume.pdf");
        fs::write(&path, b"%PDF-1.4 garbage without a trailer").unwrap();

        assert!(matches!(
            PdfLoader.load_pages(&path),
            Err(AppError::Knowledge(_))
        ));
    }

    #[test]
    fn test_loader_for_path() {
        let temp = TempDir::new().unwrap();
        let by_extension = temp.path().join("CV.PDF");
        let by_magic = temp.path().join("resume");
        let text = temp.path().join("resume.txt");
        fs::write(&by_magic, b"%PDF-1.7\n").unwrap();
        fs::write(&text, "Jane Doe").unwrap();

        assert_eq!(loader_for_path(&by_extension).name(), "pdf");
        assert_eq!(loader_for_path(&by_magic).name(), "pdf");
        assert_eq!(loader_for_path(&text).name(), "plain-text");
        assert_eq!(loader_for_path(&temp.path().join("missing.md")).name(), "plain-text");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = PlainTextLoader.load_pages(&temp.path().join("nope.txt"));
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = PdfLoader.load_pages(&temp.path().join("nope.pdf"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
