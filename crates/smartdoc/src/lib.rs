//! smartdoc: ask questions about an uploaded PDF document
//!
//! An upload is extracted to text and split into overlapping character
//! windows. Each question is answered by an LLM from a context built out of
//! the document's leading chunks, and every answer is kept in a per-session
//! transcript. The same [`DocumentQa`] service backs the HTTP server and the
//! command line tool.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod service;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use generation::{ContextAssembler, PromptTemplate};
pub use ingestion::{ChunkBoundary, FileParser, TextChunker};
pub use providers::{create_generator, AnswerGenerator};
pub use service::DocumentQa;
pub use session::{QaTurn, Session, SessionStore};
pub use types::{AskRequest, Chunk, Document, DocumentSummary, FileType};
