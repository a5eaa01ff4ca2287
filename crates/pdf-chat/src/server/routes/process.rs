//! Upload and process endpoint

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::time::Instant;

use super::parse_session_id;
use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ProcessResponse, UploadedFile};

/// Multipart field carrying the PDFs
const FILES_FIELD: &str = "files";

/// POST /api/sessions/:id/process - build a fresh index and conversation
pub async fn process_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>> {
    let start = Instant::now();
    let id = parse_session_id(&id)?;
    if !state.sessions().contains(id) {
        return Err(Error::SessionNotFound(id.to_string()));
    }

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::file_parse("upload", format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(FILES_FIELD) {
            tracing::debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("upload_{}.pdf", files.len() + 1));
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::file_parse(&filename, format!("Failed to read file: {}", e)))?;

        tracing::info!("Received {} ({} bytes)", filename, data.len());
        files.push(UploadedFile::new(filename, data.to_vec()));
    }

    let processed = state.pipeline().process(files).await?;
    let pages = processed.pages;
    let chunks = processed.chunks;
    let documents = processed.documents.clone();

    state
        .sessions()
        .install_conversation(id, processed.chain, processed.documents)?;

    Ok(Json(ProcessResponse {
        session_id: id,
        documents,
        pages,
        chunks,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}
