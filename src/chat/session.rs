//! Core chat session management.
//!
//! A [`ChatSession`] walks through onboarding, keeps the conversation
//! history, pulls linked content into the prompt and talks to the backend.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use tracing::{info, warn};

use crate::backend::CompletionBackend;
use crate::chat::config::ChatConfig;
use crate::chat::onboarding::{self, ASSISTANT_NAME, FIRST_QUESTION, Phase};
use crate::chat::prompt::{DEFAULT_PDF_QUESTION, context_prompt, unreachable_notice};
use crate::chat::turn::{ConversationTurn, Speaker};
use crate::client::Groq;
use crate::ingest::{IngestedContent, Ingestor, find_url};
use crate::observability::{SESSION_RESTARTS, SESSION_TURNS, STREAM_INTERRUPTS};
use crate::render::Renderer;
use crate::types::{ChatCompletionRequest, ChatMessage, Model, Usage};
use crate::{Error, Result};

/// Version written to transcript files.
const TRANSCRIPT_VERSION: u8 = 1;

/// What a call to [`ChatSession::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Input was blank; nothing happened.
    Ignored,
    /// Onboarding finished; the assistant greeted the user.
    Named {
        /// The name the user gave.
        user_name: String,
    },
    /// The model replied.
    Replied(String),
    /// The assistant answered without asking the model.
    Notice(String),
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The user's name, once known.
    pub user_name: Option<String>,
    /// The number of turns in the conversation.
    pub turn_count: usize,
    /// Whether replies are streamed.
    pub streaming: bool,
    /// Characters of linked content sent to the model.
    pub context_chars: usize,
    /// Total number of API requests made.
    pub total_requests: u64,
    /// Prompt tokens across all requests.
    pub total_prompt_tokens: u64,
    /// Completion tokens across all requests.
    pub total_completion_tokens: u64,
    /// Usage of the last reply, if the API reported it.
    pub last_turn_usage: Option<Usage>,
}

/// A chat session that manages conversation state and API interactions.
pub struct ChatSession<B: CompletionBackend = Groq> {
    backend: B,
    ingestor: Ingestor,
    config: ChatConfig,
    phase: Phase,
    turns: Vec<ConversationTurn>,
    usage_totals: Usage,
    last_turn_usage: Option<Usage>,
    request_count: u64,
}

impl<B: CompletionBackend> ChatSession<B> {
    /// Creates a session waiting for the user's name.
    pub fn new(backend: B, ingestor: Ingestor, config: ChatConfig) -> Self {
        Self {
            backend,
            ingestor,
            config,
            phase: Phase::AwaitingName,
            turns: Vec::new(),
            usage_totals: Usage::default(),
            last_turn_usage: None,
            request_count: 0,
        }
    }

    /// Handle a line the user typed.
    ///
    /// While the session is waiting for a name the input becomes the name;
    /// afterwards it is sent as a message.
    pub async fn submit(&mut self, input: &str, renderer: &mut dyn Renderer) -> Result<Outcome> {
        match self.phase {
            Phase::Ended => Err(Error::session_ended()),
            _ if input.trim().is_empty() => Ok(Outcome::Ignored),
            Phase::AwaitingName => {
                self.set_user_name(input)?;
                let user_name = input.trim().to_string();
                renderer.print_assistant(ASSISTANT_NAME, &onboarding::greeting(&user_name));
                renderer.print_assistant(ASSISTANT_NAME, FIRST_QUESTION);
                Ok(Outcome::Named { user_name })
            }
            Phase::Chatting { .. } => self.send(input, renderer).await,
        }
    }

    /// Record the user's name and start chatting.
    ///
    /// The name is not part of the conversation and costs no request. It can
    /// only be set once per session.
    pub fn set_user_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        match self.phase {
            Phase::Ended => return Err(Error::session_ended()),
            Phase::Chatting { .. } => {
                return Err(Error::validation(
                    "o nome já foi informado nesta sessão",
                    Some("user_name".to_string()),
                ));
            }
            Phase::AwaitingName if name.is_empty() => {
                return Err(Error::validation(
                    "o nome não pode ficar vazio",
                    Some("user_name".to_string()),
                ));
            }
            Phase::AwaitingName => {}
        }
        info!(user = name, "onboarding complete");
        self.phase = Phase::Chatting {
            user_name: name.to_string(),
        };
        Ok(())
    }

    /// Sends a user message and renders the reply.
    ///
    /// When the message contains a link, the linked page, PDF or video
    /// transcript is loaded and wrapped around the question. A link that
    /// cannot be read produces a notice instead of a request.
    ///
    /// On failure the user's turn is removed again and the error returned.
    pub async fn send(&mut self, input: &str, renderer: &mut dyn Renderer) -> Result<Outcome> {
        self.ensure_chatting()?;
        let previous_len = self.turns.len();
        self.push_turn(ConversationTurn::user(input));

        let content = match find_url(input) {
            Some(url) => {
                renderer.print_info(&format!("Lendo {url}..."));
                match self.ingestor.load_url(url).await {
                    Ok(content) => Some(content),
                    Err(err) => {
                        warn!(url, error = %err, "link could not be read");
                        let notice = unreachable_notice(url);
                        self.push_turn(ConversationTurn::assistant(notice.clone()));
                        renderer.print_assistant(ASSISTANT_NAME, &notice);
                        return Ok(Outcome::Notice(notice));
                    }
                }
            }
            None => None,
        };

        self.ask(previous_len, content.as_ref(), input, renderer)
            .await
            .map(Outcome::Replied)
    }

    /// Ask about a local PDF file.
    ///
    /// The file is read before anything is added to the conversation, so a
    /// missing or unreadable file leaves the session untouched.
    pub async fn attach_pdf(
        &mut self,
        path: &str,
        question: Option<&str>,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        self.ensure_chatting()?;
        let content = self.ingestor.load_pdf(path).await?;
        let question = question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_PDF_QUESTION);
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        let previous_len = self.turns.len();
        self.push_turn(ConversationTurn::user(format!("[PDF: {file_name}] {question}")));
        self.ask(previous_len, Some(&content), question, renderer)
            .await
    }

    /// Forget the conversation and the user's name; the next input is a name again.
    pub fn restart(&mut self) {
        SESSION_RESTARTS.click();
        info!(turns = self.turns.len(), "session restarted");
        self.turns.clear();
        self.phase = Phase::AwaitingName;
        self.usage_totals = Usage::default();
        self.last_turn_usage = None;
        self.request_count = 0;
    }

    /// Clears the conversation history, keeping the user's name.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// End the session. Later messages fail without reaching the network.
    pub fn exit(&mut self) {
        info!(turns = self.turns.len(), "session ended");
        self.phase = Phase::Ended;
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The user's name, once onboarding is complete.
    pub fn user_name(&self) -> Option<&str> {
        self.phase.user_name()
    }

    /// Whether [`exit`](Self::exit) was called.
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// The conversation so far, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Returns the number of turns in the conversation.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Label shown next to a speaker's turns.
    pub fn label_for(&self, speaker: Speaker) -> String {
        match speaker {
            Speaker::User => onboarding::initials(self.user_name().unwrap_or_default()),
            Speaker::Assistant => ASSISTANT_NAME.to_string(),
        }
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: Model) {
        self.config.model = model;
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Saves the transcript to the specified path.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let transcript = TranscriptFile {
            version: TRANSCRIPT_VERSION,
            user_name: self.user_name().map(str::to_string),
            turns: self.turns.clone(),
        };
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("não foi possível criar o arquivo da conversa", err))?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &transcript).map_err(|err| {
            Error::serialization("não foi possível gravar a conversa", Some(Box::new(err)))
        })
    }

    /// Loads a transcript from disk, replacing the current conversation history.
    ///
    /// A transcript that names its user completes onboarding.
    pub fn load_transcript_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if self.is_ended() {
            return Err(Error::session_ended());
        }
        let file = File::open(path.as_ref())
            .map_err(|err| Error::io("não foi possível abrir o arquivo da conversa", err))?;
        let reader = BufReader::new(file);
        let transcript: TranscriptFile = from_reader(reader).map_err(|err| {
            Error::serialization("arquivo de conversa inválido", Some(Box::new(err)))
        })?;
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(Error::validation(
                format!("versão de conversa não suportada: {}", transcript.version),
                Some("version".to_string()),
            ));
        }
        self.turns = transcript.turns;
        if let Some(user_name) = transcript.user_name.filter(|n| !n.trim().is_empty()) {
            self.phase = Phase::Chatting { user_name };
        }
        Ok(())
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            user_name: self.user_name().map(str::to_string),
            turn_count: self.turns.len(),
            streaming: self.config.stream,
            context_chars: self.config.context_chars,
            total_requests: self.request_count,
            total_prompt_tokens: self.usage_totals.prompt_tokens,
            total_completion_tokens: self.usage_totals.completion_tokens,
            last_turn_usage: self.last_turn_usage,
        }
    }

    fn ensure_chatting(&self) -> Result<()> {
        match self.phase {
            Phase::Chatting { .. } => Ok(()),
            Phase::Ended => Err(Error::session_ended()),
            Phase::AwaitingName => Err(Error::validation(
                "diga seu nome antes de enviar mensagens",
                Some("user_name".to_string()),
            )),
        }
    }

    fn push_turn(&mut self, turn: ConversationTurn) {
        SESSION_TURNS.click();
        self.turns.push(turn);
    }

    /// Request a reply to the last turn; rolls back to `previous_len` on failure.
    async fn ask(
        &mut self,
        previous_len: usize,
        content: Option<&IngestedContent>,
        question: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let request = self.build_request(content, question);
        renderer.start_thinking();
        self.request_count = self.request_count.saturating_add(1);

        let reply = if self.config.stream {
            self.stream_reply(request, renderer).await
        } else {
            self.complete_reply(request, renderer).await
        };

        match reply {
            Ok((text, usage)) => {
                if let Some(usage) = usage {
                    self.usage_totals = self.usage_totals + usage;
                }
                self.last_turn_usage = usage;
                self.push_turn(ConversationTurn::assistant(text.clone()));
                Ok(text)
            }
            Err(err) => {
                self.turns.truncate(previous_len);
                Err(err)
            }
        }
    }

    /// System prompt, every turn but the last, then the last user turn,
    /// wrapped around `content` when there is any.
    fn build_request(
        &self,
        content: Option<&IngestedContent>,
        question: &str,
    ) -> ChatCompletionRequest {
        let (last, history) = match self.turns.split_last() {
            Some((last, history)) => (Some(last), history),
            None => (None, &self.turns[..]),
        };
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.push(ChatMessage::system(self.config.system_prompt.clone()));
        messages.extend(history.iter().map(ConversationTurn::to_message));
        match (content, last) {
            (Some(content), _) => {
                info!(kind = %content.kind, source = %content.source, "adding linked content to the prompt");
                messages.push(ChatMessage::user(context_prompt(
                    content,
                    question,
                    self.config.context_chars,
                )));
            }
            (None, Some(last)) => messages.push(last.to_message()),
            (None, None) => {}
        }

        let mut request = ChatCompletionRequest::new(self.config.model.clone(), messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);
        request.stream = self.config.stream;
        request
    }

    async fn complete_reply(
        &self,
        request: ChatCompletionRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<(String, Option<Usage>)> {
        let completion = self.backend.complete(request).await?;
        let text = completion
            .text()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::api(
                    200,
                    Some("empty_response".to_string()),
                    "a resposta veio vazia".to_string(),
                    None,
                )
            })?;
        renderer.start_response(ASSISTANT_NAME);
        renderer.print_text(&text);
        renderer.finish_response();
        Ok((text, completion.usage))
    }

    async fn stream_reply(
        &self,
        request: ChatCompletionRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<(String, Option<Usage>)> {
        let mut stream = self.backend.complete_streaming(request).await?;
        renderer.start_response(ASSISTANT_NAME);

        let mut text = String::new();
        let mut usage = None;
        while let Some(chunk) = stream.next().await {
            if renderer.should_interrupt() {
                STREAM_INTERRUPTS.click();
                renderer.print_interrupted();
                if text.is_empty() {
                    return Err(Error::abort("resposta interrompida antes de chegar qualquer texto"));
                }
                return Ok((text, usage));
            }
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    renderer.finish_response();
                    return Err(err);
                }
            };
            if let Some(delta) = chunk.delta_text() {
                renderer.print_text(delta);
                text.push_str(delta);
            }
            if let Some(reported) = chunk.usage() {
                usage = Some(reported);
            }
        }
        renderer.finish_response();

        if text.is_empty() {
            return Err(Error::streaming("a resposta terminou sem nenhum texto", None));
        }
        Ok((text, usage))
    }
}

#[derive(Serialize, Deserialize)]
struct TranscriptFile {
    version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
    turns: Vec<ConversationTurn>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::backend::ScriptedBackend;
    use crate::ingest::{ContentKind, ContentLoader};
    use crate::types::{KnownModel, Role};

    struct Page(&'static str);

    #[async_trait::async_trait]
    impl ContentLoader for Page {
        async fn load(&self, source: &str) -> Result<IngestedContent> {
            Ok(IngestedContent::new(ContentKind::WebPage, source, self.0))
        }
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl ContentLoader for Unreachable {
        async fn load(&self, source: &str) -> Result<IngestedContent> {
            Err(Error::fetch("connection refused", Some(source.to_string())))
        }
    }

    #[derive(Default)]
    struct Recorder {
        assistant: Vec<String>,
        text: String,
        thinking: usize,
    }

    impl Renderer for Recorder {
        fn print_turn(&mut self, _: &str, text: &str, _: bool) {
            self.assistant.push(text.to_string());
        }
        fn start_thinking(&mut self) {
            self.thinking += 1;
        }
        fn start_response(&mut self, _: &str) {}
        fn print_text(&mut self, text: &str) {
            self.text.push_str(text);
        }
        fn finish_response(&mut self) {}
        fn print_error(&mut self, _: &str) {}
        fn print_info(&mut self, _: &str) {}
    }

    fn session_with(
        backend: ScriptedBackend,
        web: Arc<dyn ContentLoader>,
    ) -> ChatSession<ScriptedBackend> {
        let ingestor = Ingestor::with_loaders(web, Arc::new(Unreachable), Arc::new(Unreachable));
        ChatSession::new(backend, ingestor, ChatConfig::new().with_stream(false))
    }

    fn session(replies: &[&str]) -> ChatSession<ScriptedBackend> {
        session_with(
            ScriptedBackend::new(replies.iter().copied()),
            Arc::new(Unreachable),
        )
    }

    #[tokio::test]
    async fn first_input_is_the_name() {
        let mut session = session(&[]);
        let mut renderer = Recorder::default();
        let outcome = session.submit("  Ana  ", &mut renderer).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Named {
                user_name: "Ana".to_string()
            }
        );
        assert_eq!(session.user_name(), Some("Ana"));
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.backend().request_count(), 0);
        assert_eq!(
            renderer.assistant,
            vec!["Prazer em conhecê-lo, Ana!".to_string(), FIRST_QUESTION.to_string()]
        );
        assert_eq!(session.label_for(Speaker::User), "AN");
    }

    #[tokio::test]
    async fn name_is_set_once() {
        let mut session = session(&["Oi!"]);
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        assert!(session.set_user_name("Bia").unwrap_err().is_validation());
        let outcome = session.submit("Bia", &mut renderer).await.unwrap();
        assert_eq!(outcome, Outcome::Replied("Oi!".to_string()));
        assert_eq!(session.user_name(), Some("Ana"));
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let mut session = session(&[]);
        let mut renderer = Recorder::default();
        assert_eq!(session.submit("   ", &mut renderer).await.unwrap(), Outcome::Ignored);
        assert_eq!(session.phase(), &Phase::AwaitingName);
    }

    #[tokio::test]
    async fn send_requires_a_name() {
        let mut session = session(&["Oi!"]);
        let mut renderer = Recorder::default();
        let err = session.send("Olá", &mut renderer).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.backend().request_count(), 0);
    }

    #[tokio::test]
    async fn request_carries_system_prompt_and_history() {
        let mut session = session(&["Brasília.", "Cerca de 3 milhões."]);
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        session
            .submit("Qual a capital do Brasil?", &mut renderer)
            .await
            .unwrap();
        session
            .submit("E a população?", &mut renderer)
            .await
            .unwrap();

        let requests = session.backend().requests();
        let messages = &requests[1].messages;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[3].content, "E a população?");
        assert_eq!(session.turn_count(), 4);
        assert_eq!(renderer.thinking, 2);
        assert_eq!(renderer.text, "Brasília.Cerca de 3 milhões.");
    }

    #[tokio::test]
    async fn linked_content_becomes_the_prompt() {
        let mut session = session_with(
            ScriptedBackend::new(["É sobre Rust."]),
            Arc::new(Page("Rust é uma linguagem de sistemas.")),
        );
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        session
            .submit("Resuma https://www.rust-lang.org/ por favor", &mut renderer)
            .await
            .unwrap();

        let request = &session.backend().requests()[0];
        let last = &request.messages[request.messages.len() - 1];
        assert!(last.content.contains("extraído da página web 'https://www.rust-lang.org/'"));
        assert!(last.content.contains("Rust é uma linguagem de sistemas."));
        // History keeps what the user typed.
        assert_eq!(
            session.turns()[0].text,
            "Resuma https://www.rust-lang.org/ por favor"
        );
    }

    #[tokio::test]
    async fn unreachable_link_yields_notice_without_request() {
        let mut session = session(&[]);
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        let outcome = session
            .submit("veja http://dominio-inexistente-12345.com", &mut renderer)
            .await
            .unwrap();
        let notice = unreachable_notice("http://dominio-inexistente-12345.com");
        assert_eq!(outcome, Outcome::Notice(notice.clone()));
        assert_eq!(session.backend().request_count(), 0);
        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.turns()[1].text, notice);
    }

    #[tokio::test]
    async fn failed_request_rolls_back_the_user_turn() {
        let backend = ScriptedBackend::default();
        backend.push_error(Error::rate_limit("slow down", Some(3)));
        backend.push_reply("Agora sim.");
        let mut session = session_with(backend, Arc::new(Unreachable));
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();

        let err = session.submit("Olá", &mut renderer).await.unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(session.turn_count(), 0);

        session.submit("Olá", &mut renderer).await.unwrap();
        assert_eq!(session.turn_count(), 2);
    }

    #[tokio::test]
    async fn streaming_accumulates_chunks() {
        let mut session = session(&["Olá, tudo bem com você?"]);
        session.config.stream = true;
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        let outcome = session.submit("Oi", &mut renderer).await.unwrap();
        assert_eq!(outcome, Outcome::Replied("Olá, tudo bem com você?".to_string()));
        assert_eq!(renderer.text, "Olá, tudo bem com você?");
        assert!(session.backend().requests()[0].stream);
    }

    /// Asks to stop once `after` chunks have been printed.
    struct Interrupting {
        after: usize,
        chunks: usize,
        text: String,
        interrupted: bool,
    }

    impl Interrupting {
        fn after(after: usize) -> Self {
            Self {
                after,
                chunks: 0,
                text: String::new(),
                interrupted: false,
            }
        }
    }

    impl Renderer for Interrupting {
        fn print_turn(&mut self, _: &str, _: &str, _: bool) {}
        fn start_response(&mut self, _: &str) {}
        fn print_text(&mut self, text: &str) {
            self.chunks += 1;
            self.text.push_str(text);
        }
        fn finish_response(&mut self) {}
        fn print_error(&mut self, _: &str) {}
        fn print_info(&mut self, _: &str) {}
        fn print_interrupted(&mut self) {
            self.interrupted = true;
        }
        fn should_interrupt(&self) -> bool {
            self.chunks >= self.after
        }
    }

    #[tokio::test]
    async fn interrupted_stream_keeps_partial_text() {
        let mut session = session(&["Olá, tudo bem com você?"]);
        session.config.stream = true;
        let mut renderer = Interrupting::after(usize::MAX);
        session.submit("Ana", &mut renderer).await.unwrap();

        renderer.after = 2;
        let outcome = session.submit("Oi", &mut renderer).await.unwrap();
        assert_eq!(outcome, Outcome::Replied("Olá, tudo ".to_string()));
        assert!(renderer.interrupted);
        assert_eq!(renderer.text, "Olá, tudo ");
        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.turns()[1].role, Speaker::Assistant);
        assert_eq!(session.turns()[1].text, "Olá, tudo ");
    }

    #[tokio::test]
    async fn interrupt_before_any_text_rolls_back() {
        let mut session = session(&["Olá, tudo bem com você?"]);
        session.config.stream = true;
        let mut renderer = Interrupting::after(usize::MAX);
        session.submit("Ana", &mut renderer).await.unwrap();

        renderer.after = 0;
        let err = session.submit("Oi", &mut renderer).await.unwrap_err();
        assert!(err.is_abort(), "{err}");
        assert!(renderer.interrupted);
        assert!(renderer.text.is_empty());
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.backend().request_count(), 1);
    }

    #[tokio::test]
    async fn restart_clears_history_and_name() {
        let mut session = session(&["Oi!"]);
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        session.submit("Olá", &mut renderer).await.unwrap();
        assert_eq!(session.turn_count(), 2);

        session.restart();
        assert!(session.turns().is_empty());
        assert_eq!(session.phase(), &Phase::AwaitingName);
        assert_eq!(session.stats().total_requests, 0);

        let outcome = session.submit("Bia", &mut renderer).await.unwrap();
        assert!(matches!(outcome, Outcome::Named { user_name } if user_name == "Bia"));
    }

    #[tokio::test]
    async fn clear_keeps_the_name() {
        let mut session = session(&["Oi!"]);
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        session.submit("Olá", &mut renderer).await.unwrap();
        session.clear();
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.user_name(), Some("Ana"));
    }

    #[tokio::test]
    async fn exit_stops_all_requests() {
        let mut session = session(&["nunca"]);
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        session.exit();
        assert!(session.is_ended());
        let err = session.submit("Olá", &mut renderer).await.unwrap_err();
        assert!(err.is_session_ended());
        let err = session
            .attach_pdf("/tmp/a.pdf", None, &mut renderer)
            .await
            .unwrap_err();
        assert!(err.is_session_ended());
        assert_eq!(session.backend().request_count(), 0);
    }

    #[tokio::test]
    async fn missing_pdf_leaves_session_untouched() {
        let mut session = session(&["nunca"]);
        let mut renderer = Recorder::default();
        session.submit("Ana", &mut renderer).await.unwrap();
        let err = session
            .attach_pdf("/nao/existe.pdf", Some("Resuma"), &mut renderer)
            .await
            .unwrap_err();
        assert!(err.is_ingestion());
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.backend().request_count(), 0);
    }

    #[tokio::test]
    async fn transcript_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversa.json");

        let mut original = session(&["Oi, Ana!"]);
        let mut renderer = Recorder::default();
        original.submit("Ana", &mut renderer).await.unwrap();
        original.submit("Olá", &mut renderer).await.unwrap();
        original.save_transcript_to(&path).unwrap();

        let mut restored = session(&[]);
        restored.load_transcript_from(&path).unwrap();
        assert_eq!(restored.user_name(), Some("Ana"));
        assert_eq!(restored.turns(), original.turns());
    }

    #[test]
    fn transcript_version_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        std::fs::write(&path, r#"{"version": 9, "turns": []}"#).unwrap();
        let mut session = session(&[]);
        let err = session.load_transcript_from(&path).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.phase(), &Phase::AwaitingName);
    }

    #[test]
    fn set_model() {
        let mut session = session(&[]);
        assert_eq!(
            session.model(),
            &Model::Known(KnownModel::Llama3370bVersatile)
        );
        session.set_model(Model::Known(KnownModel::Llama318bInstant));
        assert_eq!(session.stats().model, Model::Known(KnownModel::Llama318bInstant));
    }
}
