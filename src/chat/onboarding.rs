//! The first-run sequence that asks for the user's name.

use serde::{Deserialize, Serialize};

/// Greeting shown when a session starts.
pub const WELCOME: &str = "Olá! Eu sou o Seu Blusa. Para começarmos, qual o seu nome?";

/// Invitation shown right after the greeting.
pub const FIRST_QUESTION: &str =
    "Agora, como posso te ajudar? Faça uma pergunta ou me envie um link para analisar.";

/// Display name of the assistant.
pub const ASSISTANT_NAME: &str = "Seu Blusa";

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the user to say their name.
    AwaitingName,
    /// The name is known; inputs are messages.
    Chatting {
        /// The user's display name.
        user_name: String,
    },
    /// The user left; nothing more is sent.
    Ended,
}

impl Phase {
    /// The user's name, once onboarding is complete.
    pub fn user_name(&self) -> Option<&str> {
        match self {
            Phase::Chatting { user_name } => Some(user_name),
            Phase::AwaitingName | Phase::Ended => None,
        }
    }
}

/// `Prazer em conhecê-lo, {name}!`
pub fn greeting(name: &str) -> String {
    format!("Prazer em conhecê-lo, {name}!")
}

/// Up to two leading characters of `name`, uppercased; `U` when blank.
pub fn initials(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return "U".to_string();
    }
    name.chars().take(2).flat_map(char::to_uppercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_of_names() {
        assert_eq!(initials("maria"), "MA");
        assert_eq!(initials("Él"), "ÉL");
        assert_eq!(initials("j"), "J");
        assert_eq!(initials("   "), "U");
        assert_eq!(initials(""), "U");
    }

    #[test]
    fn greeting_uses_name() {
        assert_eq!(greeting("Ana"), "Prazer em conhecê-lo, Ana!");
    }

    #[test]
    fn user_name_only_while_chatting() {
        assert_eq!(Phase::AwaitingName.user_name(), None);
        assert_eq!(Phase::Ended.user_name(), None);
        let phase = Phase::Chatting {
            user_name: "Ana".to_string(),
        };
        assert_eq!(phase.user_name(), Some("Ana"));
    }
}
