//! Seu Blusa: a terminal chat assistant that can read links for you.
//!
//! # Usage
//!
//! ```bash
//! # GROQ_API_KEY may also come from a .env file in the working directory
//! seu-blusa
//!
//! # Pick a model and wait for whole replies
//! seu-blusa --model llama-3.1-8b-instant --no-stream
//!
//! # Read settings from a YAML file
//! seu-blusa --config seu-blusa.yaml
//! ```
//!
//! The assistant first asks for your name. Afterwards every line is a
//! message; a link in a message (web page, PDF or YouTube video) is read and
//! used to answer. Type `/help` for the slash commands.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info};

use seu_blusa::chat::{
    ASSISTANT_NAME, ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer,
    Speaker, WELCOME, help_text, parse_command,
};
use seu_blusa::client::API_KEY_ENV;
use seu_blusa::ingest::Ingestor;
use seu_blusa::logging::init_logging;
use seu_blusa::{Groq, Model};

/// Main entry point for the seu-blusa shell.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let (args, _) = ChatArgs::from_command_line_relaxed("seu-blusa [OPTIONS]");
    let config = match ChatConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ERRO: configuração inválida: {}", err.user_message());
            std::process::exit(2);
        }
    };
    let _log_guard = init_logging(&config.log_file)?;
    info!(dotenv_loaded, model = %config.model, stream = config.stream, "starting seu-blusa");

    let client = match Groq::new(None) {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "{API_KEY_ENV} is not set");
            eprintln!(
                "ERRO: A chave da API da Groq não foi encontrada. Crie um arquivo .env e defina a variável '{API_KEY_ENV}'."
            );
            std::process::exit(1);
        }
    };
    let ingestor = Ingestor::new(config.languages.clone())?;
    let use_color = config.use_color;
    let mut session = ChatSession::new(client, ingestor, config);

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut renderer = PlainTextRenderer::with_color(use_color).with_interrupt(Arc::clone(&interrupted));
    let mut rl = DefaultEditor::new()?;

    renderer.print_info(&format!(
        "Seu Blusa (modelo: {}). Digite /help para ver os comandos.",
        session.model()
    ));
    renderer.print_assistant(ASSISTANT_NAME, WELCOME);

    loop {
        interrupted.store(false, Ordering::Relaxed);

        let prompt = format!("{}: ", session.label_for(Speaker::User));
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at the prompt only clears the line.
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                renderer.print_error(&format!("Falha ao ler a entrada: {err}"));
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line);

        let Some(command) = parse_command(line) else {
            if let Err(err) = session.submit(line, &mut renderer).await {
                error!(error = %err, "message failed");
                renderer.print_error(&err.user_message());
            }
            continue;
        };

        match command {
            ChatCommand::Exit => break,
            ChatCommand::Restart => {
                session.restart();
                renderer.print_info("Nova conversa iniciada.");
                renderer.print_assistant(ASSISTANT_NAME, WELCOME);
            }
            ChatCommand::Clear => {
                session.clear();
                renderer.print_info("Histórico apagado.");
            }
            ChatCommand::Pdf { path, question } => {
                renderer.print_info(&format!("Lendo {path}..."));
                if let Err(err) = session
                    .attach_pdf(&path, question.as_deref(), &mut renderer)
                    .await
                {
                    error!(path = %path, error = %err, "PDF question failed");
                    renderer.print_error(&err.user_message());
                }
            }
            ChatCommand::Model(name) => {
                session.set_model(Model::from(name.as_str()));
                renderer.print_info(&format!("Modelo alterado para {}", session.model()));
            }
            ChatCommand::SaveTranscript(path) => match session.save_transcript_to(&path) {
                Ok(()) => renderer.print_info(&format!("Conversa salva em {path}")),
                Err(err) => renderer.print_error(&format!("Não foi possível salvar: {}", err.user_message())),
            },
            ChatCommand::LoadTranscript(path) => match session.load_transcript_from(&path) {
                Ok(()) => {
                    renderer.print_info(&format!("Conversa carregada de {path}"));
                    print_history(&session, &mut renderer);
                }
                Err(err) => renderer.print_error(&format!("Não foi possível carregar: {}", err.user_message())),
            },
            ChatCommand::History => print_history(&session, &mut renderer),
            ChatCommand::Stats => print_stats(&session),
            ChatCommand::Help => {
                for line in help_text().lines() {
                    println!("    {line}");
                }
            }
            ChatCommand::Invalid(message) => renderer.print_error(&message),
        }
    }

    session.exit();
    println!("Até logo!");
    Ok(())
}

fn print_history(session: &ChatSession, renderer: &mut dyn Renderer) {
    if session.turns().is_empty() {
        renderer.print_info("(nenhuma mensagem ainda)");
        return;
    }
    for turn in session.turns() {
        let label = session.label_for(turn.role);
        renderer.print_turn(&label, &turn.text, turn.role == Speaker::User);
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Estatísticas da sessão:");
    println!("      Modelo: {}", stats.model);
    println!(
        "      Usuário: {}",
        stats.user_name.as_deref().unwrap_or("(ainda sem nome)")
    );
    println!("      Mensagens: {}", stats.turn_count);
    println!(
        "      Streaming: {}",
        if stats.streaming { "ligado" } else { "desligado" }
    );
    println!("      Conteúdo por link: até {} caracteres", stats.context_chars);
    println!(
        "      Tokens: {} no prompt / {} na resposta ({} requisições)",
        stats.total_prompt_tokens, stats.total_completion_tokens, stats.total_requests
    );
    if let Some(usage) = stats.last_turn_usage {
        println!(
            "      Última resposta: {} / {} tokens",
            usage.prompt_tokens, usage.completion_tokens
        );
    }
}
