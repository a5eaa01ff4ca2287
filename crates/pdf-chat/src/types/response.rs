//! Request and response bodies for the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::DocumentSummary;
use super::message::RenderedMessage;

/// Response to creating a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// Session state as seen by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    /// Whether documents have been processed and questions can be asked
    pub ready: bool,
    /// Documents behind the current index
    pub documents: Vec<DocumentSummary>,
    /// Rendered conversation so far
    pub history: Vec<RenderedMessage>,
}

/// Result of the "Process" action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub session_id: Uuid,
    /// Per-document extraction summary
    pub documents: Vec<DocumentSummary>,
    /// Total pages across all documents
    pub pages: u32,
    /// Chunks embedded into the index
    pub chunks: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// A question from the text input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Answer plus the full rendered history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub history: Vec<RenderedMessage>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
