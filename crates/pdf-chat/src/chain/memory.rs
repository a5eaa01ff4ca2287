//! Unbounded conversation memory

use crate::types::ChatMessage;

/// Append-only list of prior question/answer turns.
///
/// Grows for the life of the conversation; nothing is ever evicted.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    messages: Vec<ChatMessage>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed turn
    pub fn save_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.messages.push(ChatMessage::user(question));
        self.messages.push(ChatMessage::assistant(answer));
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of completed question/answer turns
    pub fn turns(&self) -> usize {
        self.messages.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_save_turn_appends_pair() {
        let mut memory = ConversationMemory::new();
        assert!(memory.is_empty());

        memory.save_turn("q1", "a1");
        memory.save_turn("q2", "a2");

        assert_eq!(memory.len(), 4);
        assert_eq!(memory.turns(), 2);
        assert_eq!(memory.messages()[0].role, Role::User);
        assert_eq!(memory.messages()[3].content, "a2");
    }
}
