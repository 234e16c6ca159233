//! Application state for the document Q&A server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::providers::AnswerGenerator;
use crate::service::DocumentQa;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<DocumentQa>,
}

impl AppState {
    /// Create state with the generator selected by configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (backend: {:?})...",
            config.llm.backend
        );
        Ok(Self::from_service(DocumentQa::from_config(config)?))
    }

    /// Create state around an explicit generator
    pub fn with_generator(config: AppConfig, generator: Arc<dyn AnswerGenerator>) -> Result<Self> {
        Ok(Self::from_service(DocumentQa::new(config, generator)?))
    }

    fn from_service(qa: DocumentQa) -> Self {
        Self { inner: Arc::new(qa) }
    }

    /// The Q&A service
    pub fn qa(&self) -> &DocumentQa {
        &self.inner
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        self.inner.config()
    }
}
