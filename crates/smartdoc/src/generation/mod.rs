//! Context assembly and prompt construction for answer generation

pub mod assembler;
pub mod prompt;

pub use assembler::{preview, truncate_chars, ContextAssembler, CONTEXT_SEPARATOR};
pub use prompt::{PromptTemplate, DEFAULT_TEMPLATE};
