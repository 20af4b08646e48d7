//! The seam between a chat session and whatever produces completions.
//!
//! [`Groq`] is the production backend; tests drive sessions with
//! [`ScriptedBackend`], which replays canned replies and records requests.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::stream;

use crate::client::{ChunkStream, Groq};
use crate::types::{ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, ChatMessage, Choice};
use crate::{Error, Result};

/// Something that can complete a chat conversation.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete the conversation and return the full reply.
    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletion>;

    /// Complete the conversation, streaming the reply.
    async fn complete_streaming(&self, request: ChatCompletionRequest) -> Result<ChunkStream>;
}

#[async_trait::async_trait]
impl CompletionBackend for Groq {
    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletion> {
        self.send(request).await
    }

    async fn complete_streaming(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        self.stream(request).await
    }
}

/// A backend that replays scripted replies in order.
///
/// Every request is recorded so callers can assert on what would have been
/// sent to the API. Streaming replies are split on whitespace boundaries.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedBackend {
    /// Create a backend that answers with `replies`, in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure as the next reply.
    pub fn push_error(&self, err: Error) {
        lock(&self.replies).push_back(Err(err));
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(Ok(reply.into()));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_reply(&self, request: ChatCompletionRequest) -> Result<String> {
        lock(&self.requests).push(request);
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| {
                Err(Error::validation(
                    "scripted backend has no reply queued",
                    None,
                ))
            })
    }
}

#[async_trait::async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletion> {
        let model = request.model.to_string();
        let text = self.next_reply(request)?;
        Ok(ChatCompletion {
            id: "scripted".to_string(),
            model,
            created: 0,
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(text),
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        })
    }

    async fn complete_streaming(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        let text = self.next_reply(request)?;
        let chunks: Vec<Result<ChatCompletionChunk>> = text
            .split_inclusive(' ')
            .map(|piece| Ok(ChatCompletionChunk::from_text("scripted", piece)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
