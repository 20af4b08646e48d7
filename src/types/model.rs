use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents a model identifier served by the Groq API.
///
/// This can be one of the Llama models the assistant is tuned for or a
/// custom string for anything else the account can reach.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier
    Custom(String),
}

/// Known Groq-hosted Llama models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownModel {
    /// Llama 3.3 70B versatile, the default.
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama3370bVersatile,

    /// Llama 3.1 8B instant.
    #[serde(rename = "llama-3.1-8b-instant")]
    Llama318bInstant,

    /// Llama 3 70B with an 8k context window.
    #[serde(rename = "llama3-70b-8192")]
    Llama370b8192,

    /// Llama 3 8B with an 8k context window.
    #[serde(rename = "llama3-8b-8192")]
    Llama38b8192,
}

impl KnownModel {
    /// All known models, default first.
    pub const ALL: [KnownModel; 4] = [
        KnownModel::Llama3370bVersatile,
        KnownModel::Llama318bInstant,
        KnownModel::Llama370b8192,
        KnownModel::Llama38b8192,
    ];

    /// The identifier the API expects.
    pub fn id(self) -> &'static str {
        match self {
            KnownModel::Llama3370bVersatile => "llama-3.3-70b-versatile",
            KnownModel::Llama318bInstant => "llama-3.1-8b-instant",
            KnownModel::Llama370b8192 => "llama3-70b-8192",
            KnownModel::Llama38b8192 => "llama3-8b-8192",
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Known(KnownModel::Llama3370bVersatile)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{known_model}"),
            Model::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for KnownModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownModel::ALL
            .into_iter()
            .find(|model| model.id() == s.trim())
            .ok_or_else(|| format!("unknown model: {s}"))
    }
}

impl FromStr for Model {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<KnownModel>()
            .map(Model::Known)
            .unwrap_or_else(|_| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        match model.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_serialization() {
        let model = Model::Known(KnownModel::Llama3370bVersatile);
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#""llama-3.3-70b-versatile""#);
    }

    #[test]
    fn custom_model_round_trips_through_json() {
        let json = r#""mixtral-8x7b-32768""#;
        let model: Model = serde_json::from_str(json).unwrap();
        assert_eq!(model, Model::Custom("mixtral-8x7b-32768".to_string()));

        let json = r#""llama-3.1-8b-instant""#;
        let model: Model = serde_json::from_str(json).unwrap();
        assert_eq!(model, Model::Known(KnownModel::Llama318bInstant));
    }

    #[test]
    fn parse_prefers_known_models() {
        assert_eq!(
            Model::from(" llama3-8b-8192 "),
            Model::Known(KnownModel::Llama38b8192)
        );
        assert_eq!(
            Model::from("gemma2-9b-it"),
            Model::Custom("gemma2-9b-it".to_string())
        );
        assert!("gpt-4".parse::<KnownModel>().is_err());
    }

    #[test]
    fn default_is_llama_33_versatile() {
        assert_eq!(Model::default().to_string(), "llama-3.3-70b-versatile");
    }
}
