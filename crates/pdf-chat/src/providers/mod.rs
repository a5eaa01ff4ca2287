//! Provider abstractions for embeddings and chat completion
//!
//! Trait-based so the conversation pipeline can be driven by the hosted API
//! in production and by in-process fakes in tests.

pub mod embedding;
pub mod llm;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::ChatModel;
pub use openai::{OpenAiChat, OpenAiClient, OpenAiEmbedder};
