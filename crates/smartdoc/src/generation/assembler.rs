//! Context assembly: turning leading chunks into the text handed to the LLM

use crate::config::ContextConfig;
use crate::types::Chunk;

/// Placed between chunk segments in the assembled context
pub const CONTEXT_SEPARATOR: &str = "\n";

/// Builds the context string from the first chunks of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAssembler {
    /// Number of leading chunks to include
    max_chunks: usize,
    /// Characters kept from each chunk
    max_chars_per_chunk: usize,
}

impl ContextAssembler {
    /// Create an assembler taking `max_chunks` chunks of at most `max_chars_per_chunk` characters
    pub fn new(max_chunks: usize, max_chars_per_chunk: usize) -> Self {
        Self {
            max_chunks,
            max_chars_per_chunk,
        }
    }

    /// Create an assembler from configuration
    pub fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.max_chunks, config.max_chars_per_chunk)
    }

    /// Number of chunks that [`Self::assemble`] will use from `chunks`
    pub fn chunks_used(&self, chunks: &[Chunk]) -> usize {
        chunks.len().min(self.max_chunks)
    }

    /// Join the first chunks, each cut to the per-chunk cap
    ///
    /// Limits larger than the available data are clamped; the output depends
    /// only on the chunk contents and the two limits.
    pub fn assemble(&self, chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .take(self.max_chunks)
            .map(|chunk| truncate_chars(&chunk.content, self.max_chars_per_chunk))
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

/// Short text shown to the user after an upload
pub fn preview(chunks: &[Chunk], max_chunks: usize, max_chars: usize) -> String {
    let joined = chunks
        .iter()
        .take(max_chunks)
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&joined, max_chars).to_string()
}

/// Longest prefix of `text` with at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks_of(contents: &[String]) -> Vec<Chunk> {
        let mut offset = 0;
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let len = c.chars().count();
                let chunk = Chunk::new(i as u32, c.clone(), offset, offset + len);
                offset += len;
                chunk
            })
            .collect()
    }

    #[test]
    fn test_caps_count_and_length() {
        let contents: Vec<String> = (0..5).map(|i| i.to_string().repeat(10_000)).collect();
        let chunks = chunks_of(&contents);

        let context = ContextAssembler::new(3, 2_000).assemble(&chunks);
        assert!(context.len() <= 3 * 2_000 + 2);

        let segments: Vec<&str> = context.split(CONTEXT_SEPARATOR).collect();
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.len() == 2_000));
        assert!(segments[2].starts_with('2'));
    }

    #[test]
    fn test_clamps_to_available_chunks() {
        let chunks = chunks_of(&["one".to_string(), "two".to_string(), "three".to_string()]);
        let assembler = ContextAssembler::new(100, 1_000_000);

        assert_eq!(assembler.assemble(&chunks), "one\ntwo\nthree");
        assert_eq!(assembler.chunks_used(&chunks), 3);
    }

    #[test]
    fn test_short_chunks_are_not_padded() {
        let chunks = chunks_of(&["tiny".to_string(), "x".repeat(50)]);
        let context = ContextAssembler::new(2, 10).assemble(&chunks);
        assert_eq!(context, format!("tiny\n{}", "x".repeat(10)));
    }

    #[test]
    fn test_deterministic() {
        let chunks = chunks_of(&["alpha beta".to_string(), "gamma".to_string()]);
        let assembler = ContextAssembler::new(2, 7);
        assert_eq!(assembler.assemble(&chunks), assembler.assemble(&chunks.clone()));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(ContextAssembler::default().assemble(&[]), "");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_preview() {
        let chunks = chunks_of(&["first".to_string(), "second".to_string(), "third".to_string()]);
        assert_eq!(preview(&chunks, 2, 1_000), "first\nsecond");
        assert_eq!(preview(&chunks, 2, 8), "first\nse");
    }
}
