//! Prompt templates for the conversational retrieval chain

use crate::retrieval::ScoredChunk;
use crate::types::{ChatMessage, Role};

/// Prompt builder for condensing follow-ups and answering from context
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render history as `Human:` / `Assistant:` lines
    pub fn format_history(history: &[ChatMessage]) -> String {
        history
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| match m.role {
                Role::User => format!("Human: {}", m.content),
                _ => format!("Assistant: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Ask the model to rewrite a follow-up as a standalone question
    pub fn build_condense_prompt(history: &[ChatMessage], question: &str) -> Vec<ChatMessage> {
        let prompt = format!(
            r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{history}
Follow Up Input: {question}
Standalone question:"#,
            history = Self::format_history(history),
            question = question
        );

        vec![ChatMessage::user(prompt)]
    }

    /// Join retrieved chunks into one context block
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Answer the question from the retrieved context only
    pub fn build_qa_prompt(context: &str, question: &str) -> Vec<ChatMessage> {
        let system = format!(
            r#"Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
----------------
{context}"#,
            context = context
        );

        vec![ChatMessage::system(system), ChatMessage::user(question)]
    }
}
