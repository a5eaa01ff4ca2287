//! Core types for the PDF chat service

pub mod document;
pub mod message;
pub mod response;

pub use document::{DocumentSummary, PageText, ParsedPdf, UploadedFile};
pub use message::{render_history, ChatMessage, RenderedMessage, Role};
pub use response::{AskRequest, AskResponse, ProcessResponse, SessionCreated, SessionInfo};
