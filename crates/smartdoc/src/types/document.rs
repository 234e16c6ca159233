//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Inserted between pages when a document is flattened to one string
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// An uploaded document: its extracted page texts plus upload metadata
///
/// Immutable once built; a new upload produces a new `Document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded by user
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the uploaded bytes (hex)
    pub content_hash: String,
    /// Extracted text, one entry per source page
    pub pages: Vec<String>,
    /// File size in bytes
    pub file_size: u64,
    /// Upload timestamp
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document from extracted pages and the raw upload
    pub fn new(filename: impl Into<String>, file_type: FileType, pages: Vec<String>, data: &[u8]) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            file_type,
            content_hash: hash_bytes(data),
            pages,
            file_size: data.len() as u64,
            ingested_at: Utc::now(),
        }
    }

    /// Number of source pages
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// All pages joined with [`PAGE_SEPARATOR`]
    pub fn full_text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }

    /// Character offset of each page's first character in [`Self::full_text`]
    pub fn page_offsets(&self) -> Vec<usize> {
        let separator_len = PAGE_SEPARATOR.chars().count();
        let mut offsets = Vec::with_capacity(self.pages.len());
        let mut offset = 0usize;

        for page in &self.pages {
            offsets.push(offset);
            offset += page.chars().count() + separator_len;
        }

        offsets
    }

    /// Whether any page has non-whitespace text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.trim().is_empty())
    }

    /// Summarize for API responses
    pub fn summary(&self, total_chunks: usize) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            filename: self.filename.clone(),
            file_type: self.file_type,
            total_pages: self.page_count(),
            total_chunks,
            total_chars: self.pages.iter().map(|p| p.chars().count()).sum(),
            file_size: self.file_size,
            content_hash: self.content_hash.clone(),
            ingested_at: self.ingested_at,
        }
    }
}

/// Lightweight view of a loaded document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub filename: String,
    pub file_type: FileType,
    pub total_pages: u32,
    pub total_chunks: usize,
    pub total_chars: usize,
    pub file_size: u64,
    pub content_hash: String,
    pub ingested_at: DateTime<Utc>,
}

/// A window of document text
///
/// Offsets count characters (Unicode scalar values) in the flattened
/// document text; `char_end` is exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the chunk sequence (0-based)
    pub index: u32,
    /// Text content
    pub content: String,
    /// First character covered
    pub char_start: usize,
    /// One past the last character covered
    pub char_end: usize,
    /// Page on which the chunk starts (1-indexed), when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(index: u32, content: String, char_start: usize, char_end: usize) -> Self {
        Self {
            index,
            content,
            char_start,
            char_end,
            page_number: None,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// Hash raw bytes for change detection
fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
