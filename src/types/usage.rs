use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Token usage reported by the completion API.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the prompt, including the system prompt and history.
    pub prompt_tokens: u64,

    /// Tokens generated for the reply.
    pub completion_tokens: u64,

    /// Sum of prompt and completion tokens.
    #[serde(default)]
    pub total_tokens: u64,
}

impl Usage {
    /// Create a new `Usage` with the given prompt and completion tokens.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_adds_fieldwise() {
        let total = Usage::new(10, 5) + Usage::new(7, 3);
        assert_eq!(total, Usage::new(17, 8));
        assert_eq!(total.total_tokens, 25);
    }

    #[test]
    fn missing_total_defaults_to_zero() {
        let usage: Usage =
            serde_json::from_str(r#"{"prompt_tokens": 3, "completion_tokens": 4}"#).unwrap();
        assert_eq!(usage.total_tokens, 0);
    }
}
