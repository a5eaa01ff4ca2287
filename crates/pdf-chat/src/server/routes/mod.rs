//! API routes for the chat server

pub mod ask;
pub mod process;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        // Uploads get the larger body limit
        .route(
            "/sessions/:id/process",
            post(process::process_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/sessions/:id/ask", post(ask::ask_question))
        .route("/info", get(info))
}

/// Session ids that fail to parse can never name a live session
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::SessionNotFound(raw.to_string()))
}

/// API info endpoint
async fn info(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<serde_json::Value> {
    let config = state.config();
    axum::Json(serde_json::json!({
        "name": "pdf-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chat with multiple PDFs using retrieval-augmented generation",
        "models": {
            "embeddings": config.openai.embed_model,
            "chat": state.llm().model(),
        },
        "chunking": {
            "separator": config.chunking.separator,
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "top_k": config.retrieval.top_k,
        "active_sessions": state.sessions().len(),
        "endpoints": {
            "POST /api/sessions": "Start a session",
            "GET /api/sessions/:id": "Session summary and chat history",
            "DELETE /api/sessions/:id": "End a session",
            "POST /api/sessions/:id/process": "Upload PDFs (multipart field `files`) and build the index",
            "POST /api/sessions/:id/ask": "Ask a question about the processed PDFs"
        }
    }))
}
