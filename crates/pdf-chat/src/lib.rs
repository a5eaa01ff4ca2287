//! pdf-chat: ask questions about a set of uploaded PDFs
//!
//! Uploaded PDFs are reduced to text, split into overlapping chunks, embedded
//! with a hosted embedding model and indexed for nearest-neighbour search.
//! Questions are answered by a hosted chat model from the retrieved chunks,
//! with follow-ups condensed against the conversation so far.

pub mod chain;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::ChatConfig;
pub use error::{Error, Result};
pub use pipeline::{handle_user_input, Pipeline, ProcessedDocuments};
