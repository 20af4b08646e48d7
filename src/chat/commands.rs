//! Slash command parsing for the chat shell.
//!
//! Commands start with `/` and control the session; they are never sent to
//! the model.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start a new session: forget the history and ask for the name again.
    Restart,

    /// Clear the conversation history, keeping the user's name.
    Clear,

    /// End the session and leave the shell.
    Exit,

    /// Ask about a local PDF file.
    Pdf {
        /// Path to the file.
        path: String,
        /// Question about the document; a summary is requested when absent.
        question: Option<String>,
    },

    /// Change the model.
    Model(String),

    /// Save the transcript to a file.
    SaveTranscript(String),

    /// Replace the conversation with a transcript from a file.
    LoadTranscript(String),

    /// Print the conversation so far.
    History,

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `None` when the input is a regular message.
///
/// ```
/// # use seu_blusa::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/sair"), Some(ChatCommand::Exit));
/// assert!(parse_command("/model llama-3.1-8b-instant").is_some());
/// assert!(parse_command("Olá, Seu Blusa!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let (command, argument) = match rest.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, Some(argument.trim())),
        None => (rest, None),
    };
    let argument = argument.filter(|s| !s.is_empty());

    let result = match command.to_lowercase().as_str() {
        "restart" | "reiniciar" => ChatCommand::Restart,
        "clear" | "limpar" => ChatCommand::Clear,
        "exit" | "quit" | "q" | "sair" => ChatCommand::Exit,
        "help" | "?" | "ajuda" => ChatCommand::Help,
        "history" | "historico" => ChatCommand::History,
        "stats" | "status" => ChatCommand::Stats,
        "pdf" => match argument {
            Some(arg) => parse_pdf_argument(arg),
            None => ChatCommand::Invalid("/pdf precisa do caminho de um arquivo".to_string()),
        },
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model precisa do nome de um modelo".to_string()),
        },
        "save" => match argument {
            Some(arg) => ChatCommand::SaveTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/save precisa do caminho de um arquivo".to_string()),
        },
        "load" => match argument {
            Some(arg) => ChatCommand::LoadTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/load precisa do caminho de um arquivo".to_string()),
        },
        "" => ChatCommand::Invalid("Comando vazio; tente /help".to_string()),
        other => ChatCommand::Invalid(format!("Comando desconhecido: /{other}")),
    };

    Some(result)
}

/// `<path> [question]`, where a path containing spaces may be quoted.
fn parse_pdf_argument(arg: &str) -> ChatCommand {
    let (path, question) = if let Some(quoted) = arg.strip_prefix('"') {
        let Some((path, rest)) = quoted.split_once('"') else {
            return ChatCommand::Invalid("o caminho do /pdf está sem as aspas de fechamento".to_string());
        };
        (path, rest)
    } else {
        arg.split_once(char::is_whitespace).unwrap_or((arg, ""))
    };

    if path.is_empty() {
        return ChatCommand::Invalid("/pdf precisa do caminho de um arquivo".to_string());
    }
    let question = Some(question.trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string);
    ChatCommand::Pdf {
        path: path.to_string(),
        question,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Comandos disponíveis:
  /restart               Começar uma nova conversa (pergunta o nome de novo)
  /clear                 Limpar o histórico, mantendo o seu nome
  /pdf <arquivo> [texto] Fazer uma pergunta sobre um PDF local
  /model <nome>          Trocar o modelo (ex.: /model llama-3.1-8b-instant)
  /save <arquivo>        Salvar a conversa em um arquivo JSON
  /load <arquivo>        Carregar uma conversa salva
  /history               Mostrar a conversa até agora
  /stats                 Mostrar estatísticas da sessão
  /help                  Mostrar esta ajuda
  /exit                  Sair (também /quit, /q ou Ctrl+D)

Envie um link (página web, PDF ou vídeo do YouTube) junto com a sua pergunta
para que o conteúdo seja analisado."#
}
