use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Usage};

/// A complete, non-streamed chat completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Unique identifier of the completion.
    pub id: String,

    /// The model that produced the completion.
    pub model: String,

    /// Creation time as a unix timestamp.
    #[serde(default)]
    pub created: u64,

    /// Generated alternatives; the assistant uses the first.
    pub choices: Vec<Choice>,

    /// Token usage for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// One generated alternative in a [`ChatCompletion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Position of the choice.
    pub index: u32,

    /// The generated message.
    pub message: ChatMessage,

    /// Why generation stopped, e.g. `stop` or `length`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// Text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_groq_response() {
        let body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1730000000,
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Olá, tudo bem?"},
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 6, "total_tokens": 26}
        }"#;
        let completion: ChatCompletion = serde_json::from_str(body).unwrap();
        assert_eq!(completion.text(), Some("Olá, tudo bem?"));
        assert_eq!(completion.usage, Some(Usage::new(20, 6)));
        assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn empty_choices_have_no_text() {
        let completion = ChatCompletion {
            id: "x".to_string(),
            model: "m".to_string(),
            created: 0,
            choices: vec![],
            usage: None,
        };
        assert!(completion.text().is_none());
    }
}
