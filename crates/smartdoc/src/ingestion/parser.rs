//! Document text extraction for PDF and plain text uploads

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::types::{Document, FileType};

/// Typographic characters that PDF fonts commonly emit, and their plain forms
const CHAR_REPLACEMENTS: &[(char, &str)] = &[
    ('\u{0000}', ""),
    ('\u{00A0}', " "),   // Non-breaking space
    ('\u{00AD}', ""),    // Soft hyphen
    ('\u{2010}', "-"),   // Hyphen
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "--"),  // Em dash
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),  // Bullet
    ('\u{2026}', "..."), // Ellipsis
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Normalize extracted PDF text
///
/// Replaces typographic glyphs with ASCII, collapses horizontal whitespace,
/// trims every line and keeps at most one blank line between paragraphs.
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match CHAR_REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => result.push_str(to),
            None => result.push(c),
        }
    }

    let result = result.replace("\r\n", "\n").replace('\r', "\n");
    let result = HORIZONTAL_SPACE.replace_all(&result, " ");
    let result = result
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_LINES.replace_all(result.trim(), "\n\n").into_owned()
}

/// Multi-format file parser
#[derive(Debug, Clone)]
pub struct FileParser {
    /// Upper bound for pdf-extract on a single document
    pdf_timeout: Duration,
}

impl Default for FileParser {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl FileParser {
    /// Create a parser with the given PDF extraction timeout
    pub fn new(pdf_timeout: Duration) -> Self {
        Self { pdf_timeout }
    }

    /// Create a parser from configuration
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Parse an upload into a [`Document`] based on its extension
    ///
    /// Fails when the type is unsupported or no text can be extracted; no
    /// partial document is ever returned.
    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<Document> {
        let file_type = FileType::from_filename(filename);

        let pages = match file_type {
            FileType::Pdf => self.parse_pdf(filename, data)?,
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data, file_type)?,
            FileType::Unknown => {
                return Err(Error::UnsupportedFileType(format!(
                    "{} - only PDF, text and markdown files are supported",
                    filename
                )));
            }
        };

        let document = Document::new(filename, file_type, pages, data);
        if !document.has_text() {
            return Err(Error::extraction(filename, "No text content could be extracted"));
        }

        tracing::info!(
            "Extracted {} pages from '{}' ({} bytes)",
            document.page_count(),
            filename,
            data.len()
        );

        Ok(document)
    }

    /// Parse a PDF into page texts
    ///
    /// Pages come from lopdf; when it finds no text at all, pdf-extract is
    /// tried on the whole file and its output kept as a single page.
    fn parse_pdf(&self, filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let pdf = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(Error::extraction(filename, "PDF has no pages"));
        }

        let pages: Vec<String> = page_numbers
            .iter()
            .map(|&page| match pdf.extract_text(&[page]) {
                Ok(text) => cleanup_pdf_text(&text),
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page, e);
                    String::new()
                }
            })
            .collect();

        if pages.iter().any(|p| !p.is_empty()) {
            return Ok(pages);
        }

        tracing::warn!(
            "Page-level extraction found no text in '{}', trying pdf-extract",
            filename
        );
        let text = cleanup_pdf_text(&self.extract_pdf_with_timeout(filename, data)?);
        if text.is_empty() {
            return Err(Error::extraction(
                filename,
                "PDF appears to be image-based or has no extractable text",
            ));
        }

        Ok(vec![text])
    }

    /// Run pdf-extract on a separate thread so problematic fonts cannot hang us
    fn extract_pdf_with_timeout(&self, filename: &str, data: &[u8]) -> Result<String> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec).map_err(|e| e.to_string());
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.pdf_timeout) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::extraction(filename, format!("pdf-extract failed: {}", e))),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The worker thread cannot be killed; it is detached and its result dropped
                tracing::error!(
                    "PDF extraction timeout after {:?} for '{}'",
                    self.pdf_timeout,
                    filename
                );
                Err(Error::extraction(
                    filename,
                    format!("Extraction timed out after {}s", self.pdf_timeout.as_secs()),
                ))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed for '{}'", filename);
                Err(Error::extraction(filename, "PDF extraction crashed"))
            }
        }
    }

    /// Parse UTF-8 text; form feeds separate pages
    fn parse_text(filename: &str, data: &[u8], file_type: FileType) -> Result<Vec<String>> {
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::extraction(filename, format!("File is not valid UTF-8: {}", e)))?;
        let content = content.replace("\r\n", "\n");

        let pages = match file_type {
            FileType::Txt => content.split('\x0C').map(str::to_string).collect(),
            _ => vec![content],
        };

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_pdf_text() {
        let raw = "The \u{FB01}rst  \u{201C}quoted\u{201D}\tline   \n\n\n\n  next\u{00A0}para\u{0000}";
        assert_eq!(cleanup_pdf_text(raw), "The first \"quoted\" line\n\nnext para");
    }

    #[test]
    fn test_parse_text_pages() {
        let parser = FileParser::default();
        let doc = parser.parse("notes.txt", b"page one\x0Cpage two").unwrap();

        assert_eq!(doc.file_type, FileType::Txt);
        assert_eq!(doc.pages, vec!["page one", "page two"]);
        assert_eq!(doc.file_size, 17);
    }

    #[test]
    fn test_markdown_is_single_page() {
        let parser = FileParser::default();
        let doc = parser.parse("README.md", b"# Title\r\n\r\nBody\x0Cstill body").unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages[0].starts_with("# Title\n\nBody"));
    }

    #[test]
    fn test_unsupported_type() {
        let parser = FileParser::default();
        let result = parser.parse("slides.pptx", b"PK");
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }

    #[test]
    fn test_corrupt_pdf_is_an_extraction_error() {
        let parser = FileParser::default();
        let result = parser.parse("broken.pdf", b"this is not a pdf at all");
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[test]
    fn test_blank_text_is_an_extraction_error() {
        let parser = FileParser::default();
        let result = parser.parse("empty.txt", b"  \n\t ");
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_an_extraction_error() {
        let parser = FileParser::default();
        let result = parser.parse("bin.txt", &[0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }
}
