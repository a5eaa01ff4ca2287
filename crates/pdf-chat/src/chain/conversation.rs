//! Conversational retrieval chain

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{ChatModel, EmbeddingProvider};
use crate::retrieval::{ScoredChunk, VectorIndex};
use crate::types::ChatMessage;

use super::memory::ConversationMemory;
use super::prompt::PromptBuilder;

/// Output of one question/answer turn
#[derive(Debug, Clone)]
pub struct ChainOutput {
    /// The model's answer
    pub answer: String,
    /// Question actually used for retrieval (condensed on follow-ups)
    pub standalone_question: String,
    /// Chunks the answer was grounded on
    pub sources: Vec<ScoredChunk>,
    /// Full history after this turn
    pub chat_history: Vec<ChatMessage>,
}

/// Retrieval over a vector index + hosted chat model + unbounded turn memory
pub struct ConversationChain {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn ChatModel>,
    memory: ConversationMemory,
    top_k: usize,
}

impl ConversationChain {
    /// Bind a new conversation to an index
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn ChatModel>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            memory: ConversationMemory::new(),
            top_k: top_k.max(1),
        }
    }

    /// Answer a question, then record the turn.
    ///
    /// Memory is only updated once both model calls have succeeded.
    pub async fn ask(&mut self, question: &str) -> Result<ChainOutput> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }

        let standalone_question = if self.memory.is_empty() {
            question.to_string()
        } else {
            let prompt = PromptBuilder::build_condense_prompt(self.memory.messages(), question);
            let condensed = self.llm.complete(&prompt).await?;
            let condensed = condensed.trim();
            tracing::debug!("Condensed follow-up to: {}", condensed);
            if condensed.is_empty() {
                question.to_string()
            } else {
                condensed.to_string()
            }
        };

        let sources = self
            .index
            .similarity_search(&standalone_question, self.top_k, self.embedder.as_ref())
            .await?;

        let context = PromptBuilder::build_context(&sources);
        let prompt = PromptBuilder::build_qa_prompt(&context, &standalone_question);

        tracing::info!(
            "Answering with {} using {} retrieved chunks",
            self.llm.model(),
            sources.len()
        );
        let answer = self.llm.complete(&prompt).await?;

        self.memory.save_turn(question, answer.clone());

        Ok(ChainOutput {
            answer,
            standalone_question,
            sources,
            chat_history: self.memory.messages().to_vec(),
        })
    }

    /// Conversation so far
    pub fn history(&self) -> &[ChatMessage] {
        self.memory.messages()
    }

    /// The index this conversation retrieves from
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}
