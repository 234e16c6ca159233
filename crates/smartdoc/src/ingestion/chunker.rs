//! Text chunking into overlapping character windows
//!
//! Chunk `i + 1` always starts exactly `overlap` characters before chunk `i`
//! ends, so the chunks cover the whole text with no gaps. In fixed mode every
//! chunk except the last is exactly `chunk_size` characters long and chunk
//! `i` starts at `i * (chunk_size - overlap)`. In natural mode the cut may
//! move back to a paragraph, line, sentence or word break found within a
//! small window before the target cut.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Where a chunk is allowed to end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkBoundary {
    /// Always cut at exactly `chunk_size` characters
    Fixed,
    /// Look back up to `window` characters for a natural break
    Natural { window: usize },
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Cut point strategy
    boundary: ChunkBoundary,
}

impl TextChunker {
    /// Create a fixed-width chunker
    ///
    /// Fails with a configuration error unless `0 <= overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            overlap,
            boundary: ChunkBoundary::Fixed,
        })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        let chunker = Self::new(config.chunk_size, config.chunk_overlap)?;
        Ok(if config.respect_boundaries && config.boundary_window > 0 {
            chunker.with_boundary(ChunkBoundary::Natural {
                window: config.boundary_window,
            })
        } else {
            chunker
        })
    }

    /// Change the cut point strategy
    pub fn with_boundary(mut self, boundary: ChunkBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily iterate over the chunks of `text`
    pub fn chunks<'a>(&self, text: &'a str) -> ChunkIter<'a> {
        ChunkIter::new(text, self.clone())
    }

    /// Split `text` into chunks
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        self.chunks(text).collect()
    }

    /// Chunk a document's flattened text and tag each chunk with its page
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let text = doc.full_text();
        let page_offsets = doc.page_offsets();

        let chunks: Vec<Chunk> = self
            .chunks(&text)
            .map(|mut chunk| {
                // Last page starting at or before the chunk start
                let page = page_offsets.partition_point(|&offset| offset <= chunk.char_start);
                if page > 0 {
                    chunk.page_number = Some(page as u32);
                }
                chunk
            })
            .collect();

        tracing::debug!(
            "Chunked '{}' into {} chunks (size {}, overlap {})",
            doc.filename,
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }
}

/// Lazy chunk sequence over a borrowed text
///
/// Only the offsets of the chunk being cut are held, so memory stays
/// proportional to the chunk size rather than to the text.
pub struct ChunkIter<'a> {
    text: &'a str,
    chunker: TextChunker,
    /// Character and byte position where the next chunk starts
    next_start: Option<(usize, usize)>,
    index: u32,
}

impl<'a> ChunkIter<'a> {
    fn new(text: &'a str, chunker: TextChunker) -> Self {
        Self {
            text,
            chunker,
            next_start: (!text.is_empty()).then_some((0, 0)),
            index: 0,
        }
    }

    /// Pick the end of the chunk starting at `start` whose hard cut is `target`
    fn find_cut(&self, span: &Span<'a>, start: usize, target: usize) -> usize {
        let window = match self.chunker.boundary {
            ChunkBoundary::Fixed => return target,
            ChunkBoundary::Natural { window } => window,
        };

        // The cut must leave the next chunk starting after this one
        let lo = target
            .saturating_sub(window)
            .max(start + self.chunker.overlap + 1);
        if lo > target {
            return target;
        }

        span.last_cut_after(lo, target, "\n\n")
            .or_else(|| span.last_cut_after(lo, target, "\n"))
            .or_else(|| span.last_sentence_cut(lo, target))
            .or_else(|| span.last_whitespace_cut(lo, target))
            .unwrap_or(target)
    }
}

/// Byte offsets for the characters of one chunk and the one just before it
struct Span<'a> {
    text: &'a str,
    /// Character position of `offsets[0]`
    first: usize,
    /// Byte offset of each character, ending with the cut after the last one
    offsets: Vec<usize>,
    /// The chunk runs to the end of the text
    reaches_end: bool,
}

impl<'a> Span<'a> {
    fn new(text: &'a str, start: usize, start_byte: usize, chunk_size: usize) -> Self {
        let (first, first_byte) = match text[..start_byte].chars().next_back() {
            Some(c) => (start - 1, start_byte - c.len_utf8()),
            None => (start, start_byte),
        };

        // Every position up to and including the hard cut
        let wanted = start - first + chunk_size + 1;
        let mut offsets: Vec<usize> = text[first_byte..]
            .char_indices()
            .map(|(i, _)| first_byte + i)
            .take(wanted)
            .collect();
        let reaches_end = offsets.len() < wanted;
        if reaches_end {
            offsets.push(text.len());
        }

        Self {
            text,
            first,
            offsets,
            reaches_end,
        }
    }

    /// Last cut position covered by the span
    fn last(&self) -> usize {
        self.first + self.offsets.len() - 1
    }

    fn byte(&self, pos: usize) -> usize {
        self.offsets[pos - self.first]
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.byte(start)..self.byte(end)]
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.slice(pos, pos + 1).chars().next()
    }

    /// Largest cut in `lo..=hi` that directly follows `separator`
    fn last_cut_after(&self, lo: usize, hi: usize, separator: &str) -> Option<usize> {
        let sep_len = separator.chars().count();
        (lo.max(self.first + sep_len)..=hi)
            .rev()
            .find(|&pos| self.slice(pos - sep_len, pos) == separator)
    }

    /// Largest sentence boundary in `lo..=hi`
    fn last_sentence_cut(&self, lo: usize, hi: usize) -> Option<usize> {
        // Start one character early; the slice start itself always reports
        // as a boundary and is filtered out below
        let window_start = lo.saturating_sub(1).max(self.first);
        let base = self.byte(window_start);

        self.slice(window_start, hi)
            .split_sentence_bound_indices()
            .filter_map(|(byte, _)| self.offsets.binary_search(&(base + byte)).ok())
            .map(|i| self.first + i)
            .filter(|&pos| pos >= lo && pos <= hi)
            .last()
    }

    /// Largest cut in `lo..=hi` right after a whitespace character
    fn last_whitespace_cut(&self, lo: usize, hi: usize) -> Option<usize> {
        (lo.max(self.first + 1)..=hi)
            .rev()
            .find(|&pos| self.char_at(pos - 1).is_some_and(char::is_whitespace))
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let (start, start_byte) = self.next_start?;
        let span = Span::new(self.text, start, start_byte, self.chunker.chunk_size);

        let end = if span.reaches_end {
            span.last()
        } else {
            self.find_cut(&span, start, span.last())
        };

        let chunk = Chunk::new(self.index, span.slice(start, end).to_string(), start, end);

        self.index += 1;
        self.next_start = (!span.reaches_end).then(|| {
            let next = end - self.chunker.overlap;
            (next, span.byte(next))
        });

        Some(chunk)
    }
}
