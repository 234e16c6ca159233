//! Document ingestion: text extraction and chunking

mod chunker;
mod parser;

pub use chunker::{ChunkBoundary, ChunkIter, TextChunker};
pub use parser::{cleanup_pdf_text, FileParser};
