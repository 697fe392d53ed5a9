//! Message domain types.
//!
//! An ordered `Vec<Message>` is the conversation state sent to the LLM on
//! every call: observation → prompt assembly → provider → parsed action.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (game rules, action vocabulary)
    System,
    /// The environment side: observations and instructions
    User,
    /// The model: previously chosen actions
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// A single role-tagged turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Rough token estimate for a message sequence (4 chars ≈ 1 token).
pub fn estimated_tokens(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.content.len() / 4).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("You see a fountain.");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "You see a fountain.");
        assert!(msg.is_user());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::assistant("north");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"assistant\""));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, msg);
    }

    #[test]
    fn token_estimate() {
        // 20 chars ≈ 5 tokens
        let msgs = vec![Message::user("12345678901234567890")];
        assert_eq!(estimated_tokens(&msgs), 5);
    }
}
