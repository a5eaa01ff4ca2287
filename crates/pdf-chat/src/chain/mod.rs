//! Retrieval-augmented conversation pipeline

mod conversation;
mod memory;
mod prompt;

pub use conversation::{ChainOutput, ConversationChain};
pub use memory::ConversationMemory;
pub use prompt::PromptBuilder;
