//! Question answering endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /api/sessions/:id/ask - Answer a question about the active document
pub async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let start = Instant::now();

    let question = request
        .trimmed_question()
        .ok_or_else(|| Error::InvalidRequest("Please enter a question".to_string()))?;

    let turn = state.qa().ask(&id, question).await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!("Answered in {}ms ({} / {})", processing_time_ms, turn.provider, turn.model);

    Ok(Json(AskResponse::from_turn(id, &turn, processing_time_ms)))
}
