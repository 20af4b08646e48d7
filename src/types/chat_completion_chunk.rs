use serde::{Deserialize, Serialize};

use crate::types::{Role, Usage};

/// One server-sent event of a streamed chat completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of the completion.
    pub id: String,

    /// The model producing the completion.
    #[serde(default)]
    pub model: String,

    /// Creation time as a unix timestamp.
    #[serde(default)]
    pub created: u64,

    /// Incremental updates, one per choice.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Groq-specific metadata; the final chunk carries usage here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_groq: Option<GroqMetadata>,
}

/// An incremental update to one choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Position of the choice.
    pub index: u32,

    /// The new text, and the role on the first chunk.
    #[serde(default)]
    pub delta: Delta,

    /// Set on the last chunk of the choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Text added to a choice by a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Delta {
    /// Role of the author; only present on the first chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Newly generated text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Provider metadata attached to a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroqMetadata {
    /// Request identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Token usage, reported once at the end of the stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionChunk {
    /// Text added to the first choice by this chunk.
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// Usage carried by this chunk, if any.
    pub fn usage(&self) -> Option<Usage> {
        self.x_groq.as_ref().and_then(|meta| meta.usage)
    }

    /// Build a chunk carrying only text; used by in-memory backends.
    pub fn from_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: String::new(),
            created: 0,
            choices: vec![ChunkChoice {
                index: 0,
                delta: Delta {
                    role: None,
                    content: Some(text.into()),
                },
                finish_reason: None,
            }],
            x_groq: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_chunk_carries_role() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c1","object":"chat.completion.chunk","created":1,"model":"llama3-8b-8192",
                "choices":[{"index":0,"delta":{"role":"assistant","content":""},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.role, Some(Role::Assistant));
        assert!(chunk.delta_text().is_none());
    }

    #[test]
    fn final_chunk_reports_usage() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"c1","created":1,"model":"llama3-8b-8192",
                "choices":[{"index":0,"delta":{},"finish_reason":"stop"}],
                "x_groq":{"id":"req_1","usage":{"prompt_tokens":9,"completion_tokens":2,"total_tokens":11}}}"#,
        )
        .unwrap();
        assert_eq!(chunk.usage(), Some(Usage::new(9, 2)));
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
