//! Response types for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::DocumentSummary;
use crate::session::QaTurn;

/// Returned when a session is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// Returned after a document has been uploaded and chunked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: Uuid,
    pub document: DocumentSummary,
    /// Start of the document text for display
    pub preview: String,
    pub processing_time_ms: u64,
}

/// Answer to a single question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub session_id: Uuid,
    pub question: String,
    pub answer: String,
    /// Backend that produced the answer
    pub provider: String,
    pub model: String,
    /// Number of chunks that went into the context
    pub chunks_used: usize,
    /// Length of the assembled context in characters
    pub context_chars: usize,
    pub processing_time_ms: u64,
}

impl AskResponse {
    /// Build from a recorded transcript turn
    pub fn from_turn(session_id: Uuid, turn: &QaTurn, processing_time_ms: u64) -> Self {
        Self {
            session_id,
            question: turn.question.clone(),
            answer: turn.answer.clone(),
            provider: turn.provider.clone(),
            model: turn.model.clone(),
            chunks_used: turn.chunks_used,
            context_chars: turn.context_chars,
            processing_time_ms,
        }
    }
}

/// Everything the presentation layer needs to render a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    /// "empty" or "ready"
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Question/answer pairs in arrival order
    pub transcript: Vec<QaTurn>,
}
