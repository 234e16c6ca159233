//! Document upload endpoint

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// POST /api/sessions/:id/document - Replace the session's document
///
/// Expects a multipart field named `file`; other fields are ignored.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let start = Instant::now();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::InvalidRequest("Uploaded file has no filename".to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read file: {}", e)))?;

        tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

        let loaded = state.qa().load_document(&id, &filename, data).await?;

        return Ok(Json(UploadResponse {
            session_id: id,
            document: loaded.summary(),
            preview: state.qa().preview(&loaded),
            processing_time_ms: start.elapsed().as_millis() as u64,
        }));
    }

    Err(Error::InvalidRequest(
        "No file uploaded; send it in a multipart field named 'file'".to_string(),
    ))
}
