// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;

// Re-exports
pub use backend::{CompletionBackend, ScriptedBackend};
pub use client::Groq;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
