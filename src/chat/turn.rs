//! One entry of the conversation history.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{ChatMessage, Role};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person chatting.
    User,
    /// The assistant.
    Assistant,
}

impl From<Speaker> for Role {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => Role::User,
            Speaker::Assistant => Role::Assistant,
        }
    }
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Author of the turn.
    pub role: Speaker,

    /// What was said.
    pub text: String,

    /// When the turn was recorded, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time.
    pub fn new(role: Speaker, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// A turn said by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    /// A turn said by the assistant.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    /// The turn as a wire message.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage::new(self.role.into(), self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn serializes_timestamp_as_rfc3339() {
        let turn = ConversationTurn {
            role: Speaker::Assistant,
            text: "Olá!".to_string(),
            timestamp: datetime!(2024-05-01 12:30:00 UTC),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(
            json,
            r#"{"role":"assistant","text":"Olá!","timestamp":"2024-05-01T12:30:00Z"}"#
        );
        let back: ConversationTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let json = r#"{"role":"user","text":"x","timestamp":"yesterday"}"#;
        assert!(serde_json::from_str::<ConversationTurn>(json).is_err());
    }

    #[test]
    fn converts_to_message() {
        let message = ConversationTurn::user("Qual o seu nome?").to_message();
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "Qual o seu nome?");
    }
}
