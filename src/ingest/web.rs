//! Web page adapter: fetch a URL and reduce it to readable text.

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, header};
use tracing::{debug, warn};

use super::html::{html_to_text, normalize_whitespace};
use super::pdf::extract_pdf_text;
use super::{ContentKind, ContentLoader, IngestedContent, validate_http_url};
use crate::{Error, Result};

/// Browser-like user agent; several sites refuse unknown clients.
pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_2) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
const MAX_REDIRECTS: usize = 5;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Pages are cut here; only the first few thousand characters reach the model.
const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;
/// A cut PDF cannot be parsed, so larger documents are refused.
const MAX_PDF_BYTES: usize = 25 * 1024 * 1024;

/// Fetches web pages (and PDFs served over HTTP).
#[derive(Debug, Clone)]
pub struct WebPageLoader {
    client: Client,
}

impl WebPageLoader {
    /// Create a loader with the default timeout and redirect policy.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ContentLoader for WebPageLoader {
    async fn load(&self, source: &str) -> Result<IngestedContent> {
        let url = validate_http_url(source)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::fetch(format!("request failed: {e}"), Some(source.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(
                format!("server answered HTTP {status}"),
                Some(source.to_string()),
            ));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        debug!(url = %response.url(), %content_type, "fetched web resource");

        let is_pdf = content_type.contains("application/pdf")
            || url.path().to_ascii_lowercase().ends_with(".pdf");
        if is_pdf {
            if response.content_length().is_some_and(|len| len > MAX_PDF_BYTES as u64) {
                return Err(too_large(source, MAX_PDF_BYTES));
            }
            let (bytes, truncated) =
                read_limited(response.bytes_stream(), MAX_PDF_BYTES, source).await?;
            if truncated {
                return Err(too_large(source, MAX_PDF_BYTES));
            }
            let text = extract_pdf_text(bytes).await?;
            return Ok(IngestedContent::new(ContentKind::Pdf, source, text));
        }

        let (bytes, truncated) =
            read_limited(response.bytes_stream(), MAX_PAGE_BYTES, source).await?;
        if truncated {
            warn!(url = source, limit = MAX_PAGE_BYTES, "page body truncated");
        }
        let body = String::from_utf8_lossy(&bytes);
        let text = if content_type.contains("html") || content_type.is_empty() {
            html_to_text(&body)
        } else if content_type.starts_with("text/") || content_type.contains("json") {
            normalize_whitespace(&body)
        } else {
            return Err(Error::extraction(format!(
                "unsupported content type '{content_type}'"
            )));
        };

        if text.is_empty() {
            return Err(Error::extraction("page has no readable text"));
        }
        Ok(IngestedContent::new(ContentKind::WebPage, source, text))
    }
}

/// Collect at most `limit` bytes of a body; the flag tells whether more followed.
async fn read_limited<S, E>(body: S, limit: usize, source: &str) -> Result<(Vec<u8>, bool)>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            Error::fetch(format!("failed to read body: {e}"), Some(source.to_string()))
        })?;
        let room = limit - buf.len();
        if chunk.len() > room {
            buf.extend_from_slice(&chunk[..room]);
            return Ok((buf, true));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok((buf, false))
}

fn too_large(source: &str, limit: usize) -> Error {
    Error::fetch(
        format!("document is larger than {} MiB", limit / (1024 * 1024)),
        Some(source.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn body(chunks: &'static [&'static str]) -> impl Stream<Item = std::result::Result<Bytes, String>> {
        stream::iter(
            chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn small_bodies_are_read_whole() {
        let (bytes, truncated) = read_limited(body(&["<p>Olá", "</p>"]), 64, "https://example.com")
            .await
            .unwrap();
        assert_eq!(bytes, "<p>Olá</p>".as_bytes());
        assert!(!truncated);
    }

    #[tokio::test]
    async fn large_bodies_stop_at_the_limit() {
        let (bytes, truncated) = read_limited(body(&["abcd", "efgh", "ijkl"]), 6, "https://example.com")
            .await
            .unwrap();
        assert_eq!(bytes, b"abcdef");
        assert!(truncated);
    }

    #[tokio::test]
    async fn body_errors_are_fetch_errors() {
        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err("connection reset".to_string()),
        ]);
        let err = read_limited(failing, 64, "https://example.com").await.unwrap_err();
        assert!(err.is_ingestion(), "{err}");
    }

    #[tokio::test]
    async fn rejects_non_http_schemes() {
        let loader = WebPageLoader::new().unwrap();
        let err = loader.load("ftp://example.com/file").await.unwrap_err();
        assert!(err.is_validation(), "{err}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let loader = WebPageLoader::new().unwrap();
        let err = loader.load("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_ingestion(), "{err}");
    }
}
