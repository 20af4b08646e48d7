use serde::{Deserialize, Serialize};

/// Role of a message sent to or received from the completion API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the whole conversation.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// A single message in a chat completion request or response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// The role of the message author.
    pub role: Role,

    /// The text of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a new `ChatMessage` with the given role and content.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn serializes_lowercase_role() {
        let message = ChatMessage::system("Seja breve.");
        assert_eq!(
            to_value(&message).unwrap(),
            json!({"role": "system", "content": "Seja breve."})
        );
    }

    #[test]
    fn deserializes_assistant_message() {
        let message: ChatMessage =
            serde_json::from_value(json!({"role": "assistant", "content": "Oi!"})).unwrap();
        assert_eq!(message, ChatMessage::assistant("Oi!"));
    }
}
