//! Session lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{CreateSessionResponse, SessionView};

/// POST /api/sessions - Start an empty session
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.qa().create_session();
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// GET /api/sessions/:id - Current state, preview and transcript
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    Ok(Json(state.qa().session_view(&id)?))
}

/// DELETE /api/sessions/:id - Drop a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.qa().close_session(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
