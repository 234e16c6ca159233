//! Document Q&A orchestration: upload → chunk → session, question → answer

use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::generation::{preview, ContextAssembler};
use crate::ingestion::{FileParser, TextChunker};
use crate::providers::{create_generator, AnswerGenerator};
use crate::session::{LoadedDocument, QaTurn, SessionStore};
use crate::types::SessionView;

/// The core service shared by the HTTP server and the CLI
pub struct DocumentQa {
    config: AppConfig,
    parser: FileParser,
    chunker: TextChunker,
    assembler: ContextAssembler,
    generator: Arc<dyn AnswerGenerator>,
    sessions: SessionStore,
}

impl DocumentQa {
    /// Create the service with an explicit answer generator
    ///
    /// Invalid chunking or context parameters are rejected here, before any
    /// document is processed.
    pub fn new(config: AppConfig, generator: Arc<dyn AnswerGenerator>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            parser: FileParser::from_config(&config.extraction),
            chunker: TextChunker::from_config(&config.chunking)?,
            assembler: ContextAssembler::from_config(&config.context),
            sessions: SessionStore::new(config.session.max_sessions),
            generator,
            config,
        })
    }

    /// Create the service with the generator selected by configuration
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let generator = create_generator(&config.llm)?;
        Self::new(config, generator)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn generator(&self) -> &Arc<dyn AnswerGenerator> {
        &self.generator
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Start a new empty session
    pub fn create_session(&self) -> Uuid {
        self.sessions.create()
    }

    /// Drop a session and everything it holds
    pub fn close_session(&self, session_id: &Uuid) -> Result<()> {
        if self.sessions.remove(session_id) {
            tracing::info!("Closed session {}", session_id);
            Ok(())
        } else {
            Err(Error::SessionNotFound(*session_id))
        }
    }

    /// Transcript, document summary and preview of a session
    pub fn session_view(&self, session_id: &Uuid) -> Result<SessionView> {
        let handle = self.sessions.get(session_id)?;
        let session = handle.read();
        Ok(session.view(self.config.context.preview_chunks, self.config.context.preview_chars))
    }

    /// Extract, chunk and activate an uploaded document
    ///
    /// On any failure the session keeps whatever document it had before.
    pub async fn load_document(
        &self,
        session_id: &Uuid,
        filename: &str,
        data: Bytes,
    ) -> Result<LoadedDocument> {
        let handle = self.sessions.get(session_id)?;
        let start = Instant::now();

        let parser = self.parser.clone();
        let chunker = self.chunker.clone();
        let name = filename.to_string();

        // Extraction is CPU bound and may block on pathological PDFs
        let (document, chunks) = tokio::task::spawn_blocking(move || {
            let document = parser.parse(&name, &data)?;
            let chunks = chunker.chunk_document(&document);
            Ok::<_, Error>((document, chunks))
        })
        .await
        .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))??;

        let loaded = handle.write().load(document, chunks);
        let summary = loaded.summary();

        tracing::info!(
            "Session {}: loaded '{}' ({} pages, {} chunks) in {}ms",
            session_id,
            summary.filename,
            summary.total_pages,
            summary.total_chunks,
            start.elapsed().as_millis()
        );

        Ok(loaded)
    }

    /// Start of a loaded document's text, as shown after an upload
    pub fn preview(&self, loaded: &LoadedDocument) -> String {
        preview(
            &loaded.chunks,
            self.config.context.preview_chunks,
            self.config.context.preview_chars,
        )
    }

    /// Answer a question about the session's active document
    ///
    /// Nothing is added to the transcript unless an answer was produced for
    /// the document that is still active.
    pub async fn ask(&self, session_id: &Uuid, question: &str) -> Result<QaTurn> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("Please enter a question".to_string()));
        }

        let handle = self.sessions.get(session_id)?;
        let loaded = handle.read().active().cloned().ok_or(Error::NoDocument)?;

        let context = self.assembler.assemble(&loaded.chunks);
        if context.trim().is_empty() {
            return Err(Error::NoUsableText);
        }
        let chunks_used = self.assembler.chunks_used(&loaded.chunks);

        tracing::info!(
            "Session {}: question \"{}\" ({} chunks, {} context chars)",
            session_id,
            question,
            chunks_used,
            context.chars().count()
        );

        let limit = self.config.llm.interaction_timeout();
        let answer = tokio::time::timeout(limit, self.generator.generate_answer(&context, question))
            .await
            .map_err(|_| Error::LlmTimeout(limit.as_secs()))??;

        let turn = QaTurn {
            question: question.to_string(),
            answer,
            provider: self.generator.name().to_string(),
            model: self.generator.model().to_string(),
            chunks_used,
            context_chars: context.chars().count(),
            asked_at: Utc::now(),
        };

        handle.write().record(loaded.document.id, turn.clone())?;
        Ok(turn)
    }
}
