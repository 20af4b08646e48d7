//! The Seu Blusa chat: onboarding, conversation history and prompt building.
//!
//! - [`config`]: CLI arguments, YAML file and environment
//! - [`session`]: the session state machine and API interaction
//! - [`commands`]: slash command parsing
//! - [`onboarding`]: welcome texts and lifecycle phases
//! - [`prompt`]: the persona and the wrapper around linked content

pub mod commands;
pub mod config;
pub mod onboarding;
pub mod prompt;
pub mod session;
pub mod turn;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile};
pub use onboarding::{ASSISTANT_NAME, FIRST_QUESTION, Phase, WELCOME};
pub use session::{ChatSession, Outcome, SessionStats};
pub use turn::{ConversationTurn, Speaker};
