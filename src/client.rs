use std::env;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{ChatCompletion, ChatCompletionChunk, ChatCompletionRequest};

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the Groq API key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// A boxed stream of completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// Client for the Groq chat completions API.
#[derive(Debug, Clone)]
pub struct Groq {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl Groq {
    /// Create a new Groq client.
    ///
    /// The API key can be provided directly or read from the GROQ_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    Error::authentication(format!(
                        "API key not provided and {API_KEY_ENV} environment variable not set"
                    ))
                })?,
        };
        // Rejected here rather than when building headers for every request.
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.trim().parse::<f64>().ok())
            .map(|secs| secs.ceil() as u64);

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_message = detail
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| error_body.clone());
        let error_param = detail.as_ref().and_then(|e| e.param.clone());

        match status_code {
            400 => Error::bad_request(error_message, error_param),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message, request_id),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message, request_id),
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    async fn post(&self, request: &ChatCompletionRequest, headers: HeaderMap) -> Result<Response> {
        let url = format!("{}chat/completions", self.base_url);
        CLIENT_REQUESTS.click();
        debug!(model = %request.model, messages = request.messages.len(), stream = request.stream, "sending chat completion request");

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e));
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                warn!(error = %err, "chat completion request failed");
                return Err(err);
            }
        };

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            warn!(error = %err, "chat completion API returned an error");
            return Err(err);
        }
        Ok(response)
    }

    /// Send a chat completion request and wait for the full reply.
    pub async fn send(&self, mut request: ChatCompletionRequest) -> Result<ChatCompletion> {
        request.stream = false;
        let response = self.post(&request, self.default_headers()?).await?;
        response.json::<ChatCompletion>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    /// Send a chat completion request and stream the reply as chunks.
    pub async fn stream(&self, mut request: ChatCompletionRequest) -> Result<ChunkStream> {
        request.stream = true;
        let mut headers = self.default_headers()?;
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/event-stream"),
        );
        let response = self.post(&request, headers).await?;
        Ok(Box::pin(process_sse(Box::pin(response.bytes_stream()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = Groq::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = Groq::with_options(
            Some("test-key".to_string()),
            Some("http://localhost:8080/v1".to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1/");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_key_with_newline() {
        let err = Groq::new(Some("bad\nkey".to_string())).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn headers_carry_bearer_token() {
        let client = Groq::new(Some("gsk_test".to_string())).unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer gsk_test"
        );
    }

    #[tokio::test]
    async fn connection_refused_maps_to_connection_error() {
        let client = Groq::with_options(
            Some("test-key".to_string()),
            Some("http://127.0.0.1:9/".to_string()),
            Some(Duration::from_secs(2)),
        )
        .unwrap();
        let request = ChatCompletionRequest::new(
            crate::types::Model::default(),
            vec![crate::types::ChatMessage::user("oi")],
        );
        let err = client.send(request).await.unwrap_err();
        assert!(err.is_connection() || err.is_timeout(), "{err}");
    }
}
