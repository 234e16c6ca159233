//! Core types for the document Q&A system

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, DocumentSummary, FileType, PAGE_SEPARATOR};
pub use query::AskRequest;
pub use response::{AskResponse, CreateSessionResponse, SessionView, UploadResponse};
