//! API routes for the document Q&A server

pub mod ask;
pub mod document;
pub mod sessions;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Session lifecycle
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        // Upload, with a larger body limit
        .route(
            "/sessions/:id/document",
            post(document::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/sessions/:id/ask", post(ask::ask_question))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let generator = state.qa().generator();
    let config = state.config();

    Json(json!({
        "name": "smartdoc",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ask questions about an uploaded PDF document",
        "llm": {
            "provider": generator.name(),
            "model": generator.model(),
        },
        "chunking": {
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "context": {
            "max_chunks": config.context.max_chunks,
            "max_chars_per_chunk": config.context.max_chars_per_chunk,
        },
        "endpoints": {
            "POST /api/sessions": "Create a session",
            "GET /api/sessions/:id": "Session state, document summary and transcript",
            "DELETE /api/sessions/:id": "Close a session",
            "POST /api/sessions/:id/document": "Upload a document (multipart field 'file')",
            "POST /api/sessions/:id/ask": "Ask a question about the active document"
        }
    }))
}
