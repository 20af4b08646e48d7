//! Prompt text: the assistant persona and the wrapper around ingested content.

use crate::ingest::IngestedContent;

/// The persona sent as the system message when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Você é um assistente prestativo e amigável chamado Seu Blusa. Responda sempre em português do Brasil.";

/// How many characters of ingested content reach the model by default.
pub const DEFAULT_CONTEXT_CHARS: usize = 4000;

/// Question asked about a PDF when the user gives none.
pub const DEFAULT_PDF_QUESTION: &str = "Faça um resumo do documento.";

/// The first `limit` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Wrap ingested content and the user's question into a single user message.
pub fn context_prompt(content: &IngestedContent, question: &str, limit: usize) -> String {
    format!(
        "Com base no seguinte conteúdo extraído {} '{}':\n\
         --- CONTEÚDO ---\n\
         {}\n\
         --- FIM DO CONTEÚDO ---\n\
         Responda à pergunta do usuário de forma concisa: '{}'",
        content.kind.prompt_label(),
        content.source,
        truncate_chars(&content.text, limit),
        question.trim(),
    )
}

/// Notice shown when a link could not be read.
pub fn unreachable_notice(url: &str) -> String {
    format!(
        "Não consegui acessar o conteúdo do link {url}. Verifique se o link está correto ou se o vídeo possui legendas."
    )
}
