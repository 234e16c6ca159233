//! Per-user session: the active document's chunks and the Q&A transcript
//!
//! A session is either empty or ready. Loading a document always replaces
//! the previous one wholesale and clears the transcript; questions can only
//! be recorded while ready.

mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::preview;
use crate::types::{Chunk, Document, DocumentSummary, SessionView};

pub use store::{SessionHandle, SessionStore};

/// One answered question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaTurn {
    pub question: String,
    pub answer: String,
    /// Backend that produced the answer
    pub provider: String,
    pub model: String,
    pub chunks_used: usize,
    pub context_chars: usize,
    pub asked_at: DateTime<Utc>,
}

/// A document together with its chunks
///
/// Cloning is cheap, so callers can take a copy and release the session lock
/// before calling the LLM.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: Arc<Document>,
    pub chunks: Arc<[Chunk]>,
}

impl LoadedDocument {
    pub fn summary(&self) -> DocumentSummary {
        self.document.summary(self.chunks.len())
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No document loaded
    #[default]
    Empty,
    /// Chunks available for questions
    Ready(LoadedDocument),
}

/// Explicit session value owned by the [`SessionStore`]
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: SessionState,
    transcript: Vec<QaTurn>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Empty,
            transcript: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    /// The active document, if any
    pub fn active(&self) -> Option<&LoadedDocument> {
        match &self.state {
            SessionState::Ready(loaded) => Some(loaded),
            SessionState::Empty => None,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.active().map(|loaded| loaded.document.as_ref())
    }

    /// Chunks of the active document (empty when no document is loaded)
    pub fn chunks(&self) -> &[Chunk] {
        self.active().map(|loaded| &loaded.chunks[..]).unwrap_or(&[])
    }

    /// Question/answer pairs in arrival order
    pub fn transcript(&self) -> &[QaTurn] {
        &self.transcript
    }

    /// Make `document` the active document, dropping the old one and the transcript
    pub fn load(&mut self, document: Document, chunks: Vec<Chunk>) -> LoadedDocument {
        let loaded = LoadedDocument {
            document: Arc::new(document),
            chunks: chunks.into(),
        };

        self.state = SessionState::Ready(loaded.clone());
        self.transcript.clear();
        self.touch();

        loaded
    }

    /// Append an answer produced for `document_id`
    ///
    /// Fails without touching the transcript when no document is loaded or
    /// the answer belongs to a document that has since been replaced.
    pub fn record(&mut self, document_id: Uuid, turn: QaTurn) -> Result<()> {
        let active_id = self.document().map(|d| d.id).ok_or(Error::NoDocument)?;
        if active_id != document_id {
            return Err(Error::DocumentReplaced);
        }

        self.transcript.push(turn);
        self.touch();
        Ok(())
    }

    /// Mark the session as recently used
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Render for the presentation layer
    pub fn view(&self, preview_chunks: usize, preview_chars: usize) -> SessionView {
        let active = self.active();
        SessionView {
            session_id: self.id,
            state: if active.is_some() { "ready" } else { "empty" }.to_string(),
            document: active.map(LoadedDocument::summary),
            preview: active.map(|loaded| preview(&loaded.chunks, preview_chunks, preview_chars)),
            transcript: self.transcript.clone(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    fn document(text: &str) -> (Document, Vec<Chunk>) {
        let doc = Document::new("doc.txt", FileType::Txt, vec![text.to_string()], text.as_bytes());
        let chunks = vec![Chunk::new(0, text.to_string(), 0, text.chars().count())];
        (doc, chunks)
    }

    fn turn(question: &str) -> QaTurn {
        QaTurn {
            question: question.to_string(),
            answer: "answer".to_string(),
            provider: "test".to_string(),
            model: "test".to_string(),
            chunks_used: 1,
            context_chars: 10,
            asked_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(!session.is_ready());
        assert!(session.chunks().is_empty());
        assert!(session.transcript().is_empty());

        let view = session.view(2, 1000);
        assert_eq!(view.state, "empty");
        assert!(view.document.is_none());
    }

    #[test]
    fn test_record_requires_document() {
        let mut session = Session::new();
        let result = session.record(Uuid::new_v4(), turn("q"));
        assert!(matches!(result, Err(Error::NoDocument)));
    }

    #[test]
    fn test_reload_clears_transcript() {
        let mut session = Session::new();
        let (doc, chunks) = document("first document");
        let first = session.load(doc, chunks);
        session.record(first.document.id, turn("q1")).unwrap();
        session.record(first.document.id, turn("q2")).unwrap();
        assert_eq!(session.transcript().len(), 2);

        let (doc, chunks) = document("second document");
        session.load(doc, chunks);
        assert!(session.is_ready());
        assert!(session.transcript().is_empty());
        assert_eq!(session.chunks()[0].content, "second document");
    }

    #[test]
    fn test_answer_for_replaced_document_is_discarded() {
        let mut session = Session::new();
        let (doc, chunks) = document("old");
        let old = session.load(doc, chunks);
        let (doc, chunks) = document("new");
        session.load(doc, chunks);

        let result = session.record(old.document.id, turn("late answer"));
        assert!(matches!(result, Err(Error::DocumentReplaced)));
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_view_includes_preview_and_transcript() {
        let mut session = Session::new();
        let (doc, chunks) = document("some preview text");
        let loaded = session.load(doc, chunks);
        session.record(loaded.document.id, turn("what?")).unwrap();

        let view = session.view(2, 4);
        assert_eq!(view.state, "ready");
        assert_eq!(view.preview.as_deref(), Some("some"));
        assert_eq!(view.transcript.len(), 1);
        assert_eq!(view.document.unwrap().total_chunks, 1);
    }
}
