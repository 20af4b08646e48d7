//! Configuration for the chat shell.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! the environment, then command-line arguments parsed with `arrrg`.

use std::path::{Path, PathBuf};

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::chat::prompt::{DEFAULT_CONTEXT_CHARS, DEFAULT_SYSTEM_PROMPT};
use crate::types::Model;
use crate::{Error, Result};

/// Environment variable naming the model.
pub const MODEL_ENV: &str = "GROQ_MODEL_NAME";

/// Log file used when none is configured.
pub const DEFAULT_LOG_FILE: &str = "chat_app.log";

/// Command-line arguments for the seu-blusa shell.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: llama-3.3-70b-versatile)", "MODEL")]
    pub model: Option<String>,

    /// System prompt for the conversation.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: model limit)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature between 0 and 2", "TEMP")]
    pub temperature: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "FILE")]
    pub config: Option<String>,

    /// Where logs are written.
    #[arrrg(optional, "Log file (default: chat_app.log)", "FILE")]
    pub log_file: Option<String>,

    /// Wait for the whole reply instead of streaming it.
    #[arrrg(flag, "Disable streaming responses")]
    pub no_stream: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings read from a YAML configuration file.
///
/// ```yaml
/// model: llama-3.1-8b-instant
/// system: system.md
/// temperature: 0.4
/// context_chars: 6000
/// languages: [pt, en]
/// stream: true
/// ```
///
/// A relative `system` value ending in `.md` or `.txt` names a file next to
/// the configuration whose contents become the system prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// System prompt text, or a prompt file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens per response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Characters of ingested content sent to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_chars: Option<usize>,

    /// Preferred transcript languages, most preferred first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,

    /// Whether replies are streamed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ConfigFile {
    /// Load a configuration file, resolving a referenced system prompt file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::io(format!("não foi possível ler {}", path.display()), err))?;
        let mut config: Self = serde_yaml::from_str(&content).map_err(|err| {
            Error::configuration(format!("configuração inválida em {}: {err}", path.display()))
        })?;

        if let Some(system) = &config.system {
            let system_path = Path::new(system);
            let is_file_reference = !system_path.is_absolute()
                && !system.contains('\n')
                && matches!(
                    system_path.extension().and_then(|e| e.to_str()),
                    Some("md" | "txt")
                );
            if is_file_reference {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                let prompt_path = base.join(system_path);
                let prompt = std::fs::read_to_string(&prompt_path).map_err(|err| {
                    Error::io(format!("não foi possível ler {}", prompt_path.display()), err)
                })?;
                config.system = Some(prompt.trim().to_string());
            }
        }
        Ok(config)
    }
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// The persona sent as the system message.
    pub system_prompt: String,

    /// Maximum tokens per response; the model's limit when unset.
    pub max_tokens: Option<u32>,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Characters of ingested content sent to the model.
    pub context_chars: usize,

    /// Preferred transcript languages.
    pub languages: Vec<String>,

    /// Whether replies are streamed.
    pub stream: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Where logs are written.
    pub log_file: PathBuf,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: None,
            temperature: None,
            context_chars: DEFAULT_CONTEXT_CHARS,
            languages: vec!["pt".to_string(), "en".to_string()],
            stream: true,
            use_color: true,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }

    /// Resolve the configuration from arguments and the process environment.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve the configuration from arguments and an environment lookup.
    pub fn resolve<F>(args: ChatArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(path) = &args.config {
            config.apply_file(ConfigFile::from_file(path)?);
        }
        if let Some(model) = env(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            config.model = Model::from(model.as_str());
        }
        config.apply_args(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets whether replies are streamed.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the number of content characters sent to the model.
    pub fn with_context_chars(mut self, context_chars: usize) -> Self {
        self.context_chars = context_chars;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(model) = file.model {
            self.model = Model::from(model.as_str());
        }
        if let Some(system) = file.system {
            self.system_prompt = system;
        }
        self.max_tokens = file.max_tokens.or(self.max_tokens);
        self.temperature = file.temperature.or(self.temperature);
        self.context_chars = file.context_chars.unwrap_or(self.context_chars);
        if let Some(languages) = file.languages {
            self.languages = languages;
        }
        self.stream = file.stream.unwrap_or(self.stream);
    }

    fn apply_args(&mut self, args: ChatArgs) -> Result<()> {
        if let Some(model) = args.model {
            self.model = Model::from(model.as_str());
        }
        if let Some(system) = args.system {
            self.system_prompt = system;
        }
        self.max_tokens = args.max_tokens.or(self.max_tokens);
        if let Some(temperature) = args.temperature {
            let parsed = temperature.trim().parse::<f32>().map_err(|_| {
                Error::configuration(format!("a temperatura precisa ser um número, recebido {temperature:?}"))
            })?;
            self.temperature = Some(parsed);
        }
        if let Some(log_file) = args.log_file {
            self.log_file = PathBuf::from(log_file);
        }
        if args.no_stream {
            self.stream = false;
        }
        if args.no_color {
            self.use_color = false;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(Error::configuration(format!(
                "a temperatura precisa estar entre 0 e 2, recebido {temperature}"
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(Error::configuration("max_tokens precisa ser positivo"));
        }
        if self.context_chars == 0 {
            return Err(Error::configuration("context_chars precisa ser positivo"));
        }
        if self.languages.iter().all(|l| l.trim().is_empty()) {
            return Err(Error::configuration(
                "informe ao menos um idioma de legenda",
            ));
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}
