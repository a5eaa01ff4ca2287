//! Chat model trait for generating answers

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ChatMessage;

/// Trait for hosted chat completion
///
/// Implementations:
/// - `OpenAiChat`: hosted OpenAI-compatible `/chat/completions` endpoint
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a conversation, returning the assistant's reply
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
