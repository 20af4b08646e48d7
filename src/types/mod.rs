// Public modules
pub mod chat_completion;
pub mod chat_completion_chunk;
pub mod chat_completion_request;
pub mod chat_message;
pub mod model;
pub mod usage;

// Re-exports
pub use chat_completion::{ChatCompletion, Choice};
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, Delta, GroqMetadata};
pub use chat_completion_request::ChatCompletionRequest;
pub use chat_message::{ChatMessage, Role};
pub use model::{KnownModel, Model};
pub use usage::Usage;
