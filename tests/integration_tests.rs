//! Integration tests for the seu-blusa library.
//! Tests that talk to Groq require GROQ_API_KEY and skip without it.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;
    use seu_blusa::chat::{ChatConfig, ChatSession, Outcome, Phase, Renderer};
    use seu_blusa::ingest::{
        ContentKind, ContentLoader, IngestedContent, Ingestor, WebPageLoader,
        YoutubeTranscriptLoader,
    };
    use seu_blusa::{
        ChatCompletionRequest, ChatMessage, Error, Groq, KnownModel, Model, Result,
        ScriptedBackend,
    };

    /// Discards output.
    struct Quiet;

    impl Renderer for Quiet {
        fn print_turn(&mut self, _: &str, _: &str, _: bool) {}
        fn start_response(&mut self, _: &str) {}
        fn print_text(&mut self, _: &str) {}
        fn finish_response(&mut self) {}
        fn print_error(&mut self, _: &str) {}
        fn print_info(&mut self, _: &str) {}
    }

    struct Transcript;

    #[async_trait::async_trait]
    impl ContentLoader for Transcript {
        async fn load(&self, source: &str) -> Result<IngestedContent> {
            Ok(IngestedContent::new(
                ContentKind::YoutubeTranscript,
                source,
                "Neste vídeo falamos sobre listas em Python.",
            ))
        }
    }

    struct Offline;

    #[async_trait::async_trait]
    impl ContentLoader for Offline {
        async fn load(&self, source: &str) -> Result<IngestedContent> {
            Err(Error::fetch("offline", Some(source.to_string())))
        }
    }

    fn offline_session(replies: &[&str]) -> ChatSession<ScriptedBackend> {
        let ingestor = Ingestor::with_loaders(
            Arc::new(Offline),
            Arc::new(Transcript),
            Arc::new(Offline),
        );
        ChatSession::new(
            ScriptedBackend::new(replies.iter().copied()),
            ingestor,
            ChatConfig::new(),
        )
    }

    #[tokio::test]
    async fn test_full_conversation_flow() {
        let mut session = offline_session(&["O vídeo fala sobre listas.", "De nada!"]);
        let mut quiet = Quiet;

        let outcome = session.submit("Carla", &mut quiet).await.unwrap();
        assert!(matches!(outcome, Outcome::Named { .. }));

        let outcome = session
            .submit(
                "Sobre o que é https://www.youtube.com/watch?v=dQw4w9WgXcQ ?",
                &mut quiet,
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Replied("O vídeo fala sobre listas.".to_string()));

        let requests = session.backend().requests();
        let prompt = &requests[0].messages.last().unwrap().content;
        assert!(prompt.contains("da transcrição do vídeo do YouTube"));
        assert!(prompt.contains("listas em Python"));

        let outcome = session
            .submit("Obrigada!", &mut quiet)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Replied("De nada!".to_string()));
        assert_eq!(session.turn_count(), 4);

        session.restart();
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.phase(), &Phase::AwaitingName);

        session.exit();
        let err = session.submit("Olá", &mut quiet).await.unwrap_err();
        assert!(err.is_session_ended());
        assert_eq!(session.backend().request_count(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_domain_is_an_ingestion_error() {
        let loader = WebPageLoader::new().unwrap();
        let err = loader
            .load("http://dominio-inexistente-12345.com")
            .await
            .unwrap_err();
        assert!(err.is_ingestion(), "{err}");
    }

    #[tokio::test]
    async fn test_missing_video_is_an_ingestion_error() {
        let loader = YoutubeTranscriptLoader::new(vec!["pt".to_string(), "en".to_string()]).unwrap();
        let err = loader
            .load("https://www.youtube.com/watch?v=videoquenaoexiste")
            .await
            .unwrap_err();
        assert!(err.is_ingestion(), "{err}");
    }

    #[tokio::test]
    async fn test_simple_completion_request() {
        let api_key = std::env::var("GROQ_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: GROQ_API_KEY not set");
            return;
        }

        let client = Groq::new(api_key).expect("Failed to create client");
        let request = ChatCompletionRequest::new(
            Model::Known(KnownModel::Llama318bInstant),
            vec![ChatMessage::user("Say 'test passed'")],
        )
        .with_max_tokens(Some(10));

        let response = client.send(request).await;
        assert!(
            response.is_ok(),
            "Request should succeed with valid API key: {response:?}"
        );
    }

    #[tokio::test]
    async fn test_streaming_response() {
        let api_key = std::env::var("GROQ_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: GROQ_API_KEY not set");
            return;
        }

        let client = Groq::new(api_key).expect("Failed to create client");
        let request = ChatCompletionRequest::new(
            Model::Known(KnownModel::Llama318bInstant),
            vec![ChatMessage::user("Count to 3")],
        )
        .with_max_tokens(Some(20));

        let mut stream = client.stream(request).await.expect("Stream request should succeed");
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            if let Some(delta) = chunk.expect("chunk").delta_text() {
                text.push_str(delta);
            }
        }
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_is_an_authentication_error() {
        if std::env::var("GROQ_API_KEY").is_err() {
            eprintln!("Skipping test: GROQ_API_KEY not set");
            return;
        }

        let client = Groq::new(Some("gsk_invalid".to_string())).expect("Failed to create client");
        let request = ChatCompletionRequest::new(Model::default(), vec![ChatMessage::user("Oi")]);
        let err = client.send(request).await.unwrap_err();
        assert!(err.is_authentication(), "{err}");
    }
}
