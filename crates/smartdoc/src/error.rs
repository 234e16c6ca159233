//! Error types for the document Q&A system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for SmartDoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// SmartDoc errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (invalid chunk parameters, missing API keys, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text could not be extracted from an uploaded document
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The session has no document loaded yet
    #[error("No document loaded in this session")]
    NoDocument,

    /// The leading chunks of the active document hold no text to answer from
    #[error("The document has no readable text in its opening section")]
    NoUsableText,

    /// The active document changed while a question was being answered
    #[error("Document was replaced while the answer was being generated")]
    DocumentReplaced,

    /// Unknown session id
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Malformed request (empty question, missing upload, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// LLM returned something unusable
    #[error("LLM error: {0}")]
    Llm(String),

    /// LLM rejected our credentials
    #[error("LLM authentication failed: {0}")]
    LlmAuth(String),

    /// Transient LLM failure (network, rate limit, 5xx)
    #[error("LLM temporarily unavailable: {0}")]
    LlmUnavailable(String),

    /// LLM did not answer in time
    #[error("LLM did not respond within {0}s")]
    LlmTimeout(u64),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether retrying the same LLM request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LlmUnavailable(_) | Self::LlmTimeout(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Extraction { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "extraction_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_type"),
            Error::NoDocument => (StatusCode::CONFLICT, "no_document"),
            Error::NoUsableText => (StatusCode::UNPROCESSABLE_ENTITY, "no_usable_text"),
            Error::DocumentReplaced => (StatusCode::CONFLICT, "document_replaced"),
            Error::SessionNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_error"),
            Error::LlmAuth(_) => (StatusCode::BAD_GATEWAY, "llm_auth_error"),
            Error::LlmUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_unavailable"),
            Error::LlmTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "llm_timeout"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
