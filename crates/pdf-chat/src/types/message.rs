//! Chat messages and history rendering

use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions sent to the chat model
    System,
    /// The person asking questions
    User,
    /// The chat model
    Assistant,
}

impl Role {
    /// Wire name used by chat completion APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A history entry as shown in the chat view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    /// `user` or `assistant`
    pub role: Role,
    /// Message text
    pub content: String,
}

/// Render the conversation history for display.
///
/// Roles come from position, not from the stored message: even indexes are
/// the user, odd indexes the assistant.
pub fn render_history(history: &[ChatMessage]) -> Vec<RenderedMessage> {
    history
        .iter()
        .enumerate()
        .map(|(i, message)| RenderedMessage {
            role: if i % 2 == 0 { Role::User } else { Role::Assistant },
            content: message.content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_alternates_by_position() {
        let history = vec![
            ChatMessage::user("What is in the report?"),
            ChatMessage::assistant("Quarterly numbers."),
            ChatMessage::user("Which quarter?"),
            ChatMessage::assistant("Q3."),
            ChatMessage::user("dangling"),
        ];

        let rendered = render_history(&history);
        let roles: Vec<Role> = rendered.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(rendered[3].content, "Q3.");
    }

    #[test]
    fn test_render_empty_history() {
        assert!(render_history(&[]).is_empty());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
